//! Metal flashing classifier.

use super::{ClassifierInput, DamageClassifier};
use crate::domain::{CostBasis, DamageKind, FindingDraft, Severity};

/// Flags rust-coloured or dim flashing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlashingClassifier;

impl DamageClassifier for FlashingClassifier {
    fn name(&self) -> &'static str {
        "flashing"
    }

    fn classify(&self, input: &ClassifierInput<'_>) -> Vec<FindingDraft> {
        let features = input.features;
        if !features.has_red_areas && features.brightness >= input.policy.flashing_brightness {
            return Vec::new();
        }

        let rust = if features.has_red_areas {
            "rust-coloured areas and "
        } else {
            ""
        };

        vec![FindingDraft {
            category: "Metal Flashing".to_string(),
            severity: Severity::Moderate,
            description: format!(
                "Image analysis found {rust}patterns consistent with failing flashing. Check \
                 sealant, metal condition and overlap at each transition."
            ),
            location: "Roof transitions and penetrations".to_string(),
            cost: CostBasis::Range(DamageKind::FlashingConcern),
        }]
    }
}
