//! Gutter classifier.

use super::{ClassifierInput, DamageClassifier};
use crate::domain::{count_confident, CostBasis, DamageKind, FindingDraft, Severity};

/// Flags cluttered or stained gutter runs.
///
/// A gutter photo with many confidently detected objects usually means debris.
#[derive(Debug, Clone, Copy, Default)]
pub struct GutterClassifier;

impl DamageClassifier for GutterClassifier {
    fn name(&self) -> &'static str {
        "gutters"
    }

    fn classify(&self, input: &ClassifierInput<'_>) -> Vec<FindingDraft> {
        let objects = count_confident(input.detections, input.policy.min_detection_confidence);
        if objects <= input.policy.gutter_min_objects && !input.features.has_dark_spots {
            return Vec::new();
        }

        vec![FindingDraft {
            category: "Gutter System".to_string(),
            severity: Severity::Minor,
            description: format!(
                "Detected {objects} object(s) and irregular patterns suggesting debris build-up \
                 or gutter deterioration. Cleaning and inspection recommended to keep drainage \
                 clear."
            ),
            location: "Gutters and downspouts".to_string(),
            cost: CostBasis::Range(DamageKind::GutterIssue),
        }]
    }
}
