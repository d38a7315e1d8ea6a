//! Category classifiers.
//!
//! Each classifier maps a photo's feature summary (and, where useful, the
//! detector's output) to zero or more finding drafts. Classifiers are pure:
//! no state is kept between calls and costs are left to the session to price.

mod chimney;
mod flashing;
mod general;
mod gutters;
mod shingles;
mod vents;

pub use chimney::ChimneyClassifier;
pub use flashing::FlashingClassifier;
pub use general::GeneralClassifier;
pub use gutters::GutterClassifier;
pub use shingles::ShingleClassifier;
pub use vents::VentClassifier;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Detection, FeatureSummary, FindingDraft, PhotoCategory};
use crate::pricing::PricingTable;

/// Severity thresholds used by the classifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierPolicy {
    /// Darkness ratio that triggers a shingle finding.
    pub shingle_dark_trigger: f64,
    /// Darkness ratio above which shingle damage is moderate.
    pub shingle_moderate_darkness: f64,
    /// Darkness ratio above which shingle damage is severe.
    pub shingle_severe_darkness: f64,
    /// Edge density above which deterioration is reported.
    pub edge_minor: f64,
    /// Edge density above which deterioration is moderate.
    pub edge_moderate: f64,
    /// Darkness ratio above which a poor roof is severe.
    pub severe_darkness: f64,
    /// Brightness below which a poor roof is severe.
    pub severe_brightness: f64,
    /// Brightness below which flashing is reported.
    pub flashing_brightness: f64,
    /// Detections at or below this confidence are ignored.
    pub min_detection_confidence: f32,
    /// Gutter finding when confident detections exceed this count.
    pub gutter_min_objects: usize,
    /// Edge density above which the overall assessment mentions wear patterns.
    pub general_edge_note: f64,
    /// Fixed estimate for a roof in fair condition.
    pub fair_condition_cost: u32,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            shingle_dark_trigger: 0.15,
            shingle_moderate_darkness: 0.18,
            shingle_severe_darkness: 0.25,
            edge_minor: 15.0,
            edge_moderate: 25.0,
            severe_darkness: 0.3,
            severe_brightness: 60.0,
            flashing_brightness: 110.0,
            min_detection_confidence: 0.4,
            gutter_min_objects: 3,
            general_edge_note: 20.0,
            fair_condition_cost: 800,
        }
    }
}

/// Everything a classifier may look at for one photo.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput<'a> {
    /// Visual features of the photo.
    pub features: &'a FeatureSummary,
    /// Detector output for the photo.
    pub detections: &'a [Detection],
    /// Current pricing table (for narratives quoting ranges).
    pub pricing: &'a PricingTable,
    /// Severity thresholds.
    pub policy: &'a ClassifierPolicy,
}

/// Trait for implementing per-category damage classifiers.
pub trait DamageClassifier: Send + Sync {
    /// Returns the name of this classifier.
    fn name(&self) -> &'static str;

    /// Maps one photo's signals to finding drafts, empty if nothing was found.
    fn classify(&self, input: &ClassifierInput<'_>) -> Vec<FindingDraft>;
}

/// Routes photos to the classifier for their category.
pub struct ClassifierSet {
    specific: Vec<(PhotoCategory, Box<dyn DamageClassifier>)>,
    general: Box<dyn DamageClassifier>,
}

impl ClassifierSet {
    /// Creates a set with only the general classifier.
    #[must_use]
    pub fn new(general: Box<dyn DamageClassifier>) -> Self {
        Self {
            specific: Vec::new(),
            general,
        }
    }

    /// Registers (or replaces) the classifier for a category.
    #[must_use]
    pub fn with_classifier(
        mut self,
        category: PhotoCategory,
        classifier: Box<dyn DamageClassifier>,
    ) -> Self {
        self.specific.retain(|(c, _)| *c != category);
        self.specific.push((category, classifier));
        self
    }

    /// The standard roof classifiers. `damage` photos are treated as shingles.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(Box::new(GeneralClassifier))
            .with_classifier(PhotoCategory::Shingles, Box::new(ShingleClassifier))
            .with_classifier(PhotoCategory::Damage, Box::new(ShingleClassifier))
            .with_classifier(PhotoCategory::Flashing, Box::new(FlashingClassifier))
            .with_classifier(PhotoCategory::Gutters, Box::new(GutterClassifier))
            .with_classifier(PhotoCategory::Chimney, Box::new(ChimneyClassifier))
            .with_classifier(PhotoCategory::Vents, Box::new(VentClassifier))
    }

    /// Returns the classifier registered for a category, if any.
    #[must_use]
    pub fn specific_for(&self, category: PhotoCategory) -> Option<&dyn DamageClassifier> {
        self.specific
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, classifier)| classifier.as_ref())
    }

    /// Classifies one photo.
    ///
    /// The general classifier runs for `general` photos, for categories with no
    /// specific classifier, and whenever the specific classifier found nothing.
    #[must_use]
    pub fn classify(
        &self,
        category: PhotoCategory,
        input: &ClassifierInput<'_>,
    ) -> Vec<FindingDraft> {
        let mut drafts = match self.specific_for(category) {
            Some(classifier) => {
                let drafts = classifier.classify(input);
                debug!(
                    "{} classifier produced {} finding(s)",
                    classifier.name(),
                    drafts.len()
                );
                drafts
            }
            None => Vec::new(),
        };

        if category == PhotoCategory::General || drafts.is_empty() {
            drafts.extend(self.general.classify(input));
        }

        drafts
    }
}

impl Default for ClassifierSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// Whole-number percentage for narratives.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn percent(ratio: f64) -> i64 {
    (ratio * 100.0).round() as i64
}
