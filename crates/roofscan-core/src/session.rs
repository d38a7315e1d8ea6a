//! The analysis session: runs a batch of photos through the pipeline.
//!
//! A session owns the detector, the pricing table and the cost sampler, so a
//! model load and a pricing refresh happen at most once per session no matter
//! how many batches it analyzes.

use tracing::{debug, info, warn};

use crate::classifiers::{ClassifierInput, ClassifierPolicy, ClassifierSet};
use crate::domain::{
    no_damage_draft, CostBasis, DamageAnalysis, DamageFinding, FindingDraft, PhotoInput,
    SkippedPhoto,
};
use crate::error::AnalysisError;
use crate::features::{FeatureConfig, FeatureExtractor};
use crate::inference::LazyDetector;
use crate::ports::{CostSampler, ObjectDetector, PricingSource, ProgressEvent, ProgressSink};
use crate::pricing::{PricingTable, RandomCostSampler};

/// Runs damage analysis over photo batches.
pub struct AnalysisSession {
    detector: LazyDetector,
    pricing: PricingTable,
    pricing_source: Option<Box<dyn PricingSource>>,
    refresh_attempted: bool,
    extractor: FeatureExtractor,
    policy: ClassifierPolicy,
    classifiers: ClassifierSet,
    sampler: Box<dyn CostSampler>,
}

impl AnalysisSession {
    /// Creates a session with default pricing, thresholds and a random sampler.
    #[must_use]
    pub fn new(detector: LazyDetector) -> Self {
        Self {
            detector,
            pricing: PricingTable::default_table(),
            pricing_source: None,
            refresh_attempted: false,
            extractor: FeatureExtractor::default(),
            policy: ClassifierPolicy::default(),
            classifiers: ClassifierSet::standard(),
            sampler: Box::new(RandomCostSampler::new()),
        }
    }

    /// Sets the source used for the one-time pricing refresh.
    #[must_use]
    pub fn with_pricing_source(mut self, source: Box<dyn PricingSource>) -> Self {
        self.pricing_source = Some(source);
        self
    }

    /// Replaces the starting pricing table.
    #[must_use]
    pub fn with_pricing_table(mut self, table: PricingTable) -> Self {
        self.pricing = table;
        self
    }

    /// Replaces the cost sampler.
    #[must_use]
    pub fn with_sampler(mut self, sampler: Box<dyn CostSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    /// Replaces the feature extraction thresholds.
    #[must_use]
    pub fn with_feature_config(mut self, config: FeatureConfig) -> Self {
        self.extractor = FeatureExtractor::new(config);
        self
    }

    /// Replaces the classifier thresholds.
    #[must_use]
    pub fn with_policy(mut self, policy: ClassifierPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the classifier routing table.
    #[must_use]
    pub fn with_classifiers(mut self, classifiers: ClassifierSet) -> Self {
        self.classifiers = classifiers;
        self
    }

    /// Returns the current pricing table.
    #[must_use]
    pub const fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Returns the detector handle.
    #[must_use]
    pub const fn detector(&self) -> &LazyDetector {
        &self.detector
    }

    /// Analyzes a batch of photos in order.
    ///
    /// Never fails: a photo that cannot be processed is recorded in
    /// `skipped`, and a detector that cannot be loaded turns the whole run
    /// into a single manual-review finding. A non-empty batch always yields at
    /// least one finding.
    pub fn analyze(&mut self, photos: &[PhotoInput], progress: &dyn ProgressSink) -> DamageAnalysis {
        if photos.is_empty() {
            progress.on_event(ProgressEvent::Finished {
                processed: 0,
                skipped: 0,
            });
            return DamageAnalysis::new(Vec::new(), Vec::new(), self.pricing.source_label());
        }

        let detector = match self.detector.get() {
            Ok(detector) => detector,
            Err(e) => {
                warn!("Falling back to manual review: {e}");
                progress.on_event(ProgressEvent::Finished {
                    processed: 0,
                    skipped: photos.len(),
                });
                return DamageAnalysis::manual_review(self.pricing.source_label());
            }
        };

        if !self.refresh_attempted {
            self.refresh_attempted = true;
            if let Some(source) = &self.pricing_source {
                if let Err(e) = self.pricing.refresh(source.as_ref()) {
                    warn!("Keeping {} cost estimates: {e}", self.pricing.source_label());
                }
            }
        }

        let total = photos.len();
        let mut findings = Vec::new();
        let mut skipped = Vec::new();
        let mut next_id = 1_u32;

        for (index, photo) in photos.iter().enumerate() {
            progress.on_event(ProgressEvent::Started {
                current: index + 1,
                total,
                label: photo.label.clone(),
            });

            let drafts = match inspect(
                photo,
                detector,
                &self.extractor,
                &self.classifiers,
                &self.pricing,
                &self.policy,
            ) {
                Ok(drafts) => drafts,
                Err(e) => {
                    warn!("Skipping {}: {e}", photo.label);
                    progress.on_event(ProgressEvent::Skipped {
                        index,
                        label: photo.label.clone(),
                        reason: e.to_string(),
                    });
                    skipped.push(SkippedPhoto {
                        index,
                        label: photo.label.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            debug!("{} produced {} finding(s)", photo.label, drafts.len());
            for draft in drafts {
                findings.push(price(self.sampler.as_mut(), &self.pricing, draft, next_id));
                next_id += 1;
            }
        }

        if findings.is_empty() {
            debug!("No findings in batch; adding no-damage finding");
            findings.push(price(
                self.sampler.as_mut(),
                &self.pricing,
                no_damage_draft(),
                next_id,
            ));
        }

        progress.on_event(ProgressEvent::Finished {
            processed: total - skipped.len(),
            skipped: skipped.len(),
        });

        let analysis = DamageAnalysis::new(findings, skipped, self.pricing.source_label());
        info!(
            "Analyzed {} photo(s): {} finding(s), estimate ${}",
            total,
            analysis.findings.len(),
            analysis.total_estimate
        );
        analysis
    }
}

impl std::fmt::Debug for AnalysisSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisSession")
            .field("detector", &self.detector)
            .field("pricing_source", &self.pricing.source_label())
            .field("refresh_attempted", &self.refresh_attempted)
            .finish_non_exhaustive()
    }
}

/// Turns a draft into a finding, drawing a cost if it is range-based.
fn price(
    sampler: &mut dyn CostSampler,
    pricing: &PricingTable,
    draft: FindingDraft,
    id: u32,
) -> DamageFinding {
    let (estimated_cost, cost_kind) = match draft.cost {
        CostBasis::Range(kind) => (sampler.sample(&pricing.range(kind)), Some(kind)),
        CostBasis::Fixed(amount) => (amount, None),
    };

    DamageFinding {
        id,
        category: draft.category,
        severity: draft.severity,
        description: draft.description,
        estimated_cost,
        location: draft.location,
        cost_kind,
    }
}

/// Decode, extract, detect and classify a single photo.
fn inspect(
    photo: &PhotoInput,
    detector: &dyn ObjectDetector,
    extractor: &FeatureExtractor,
    classifiers: &ClassifierSet,
    pricing: &PricingTable,
    policy: &ClassifierPolicy,
) -> Result<Vec<FindingDraft>, AnalysisError> {
    let image = photo.decode()?;
    let (working, features) = extractor.extract_from(image);
    debug!(
        "{}: brightness {:.1}, darkness {:.3}, contrast {:.1}, edges {:.1}, {}",
        photo.label,
        features.brightness,
        features.darkness,
        features.contrast,
        features.edge_density,
        features.overall_condition.as_str()
    );

    let detections = detector
        .detect(&working)
        .map_err(|e| AnalysisError::Detection(format!("{e:#}")))?;

    let input = ClassifierInput {
        features: &features,
        detections: &detections,
        pricing,
        policy,
    };
    Ok(classifiers.classify(photo.category, &input))
}
