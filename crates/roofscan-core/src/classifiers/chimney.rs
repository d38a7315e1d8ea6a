//! Chimney classifier.

use super::{ClassifierInput, DamageClassifier};
use crate::domain::{Condition, CostBasis, DamageKind, FindingDraft, Severity};

/// Flags chimneys that look worn or show rust staining.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChimneyClassifier;

impl DamageClassifier for ChimneyClassifier {
    fn name(&self) -> &'static str {
        "chimney"
    }

    fn classify(&self, input: &ClassifierInput<'_>) -> Vec<FindingDraft> {
        let features = input.features;
        if features.overall_condition == Condition::Good && !features.has_red_areas {
            return Vec::new();
        }

        let (severity, kind) = if features.overall_condition == Condition::Poor {
            (Severity::Severe, DamageKind::StructuralConcern)
        } else {
            (Severity::Moderate, DamageKind::FlashingConcern)
        };
        let rust = if features.has_red_areas {
            "Rust-coloured staining present. "
        } else {
            ""
        };

        vec![FindingDraft {
            category: "Chimney Structure".to_string(),
            severity,
            description: format!(
                "Chimney shows {} concerns. {rust}Examine mortar joints, the cap and the \
                 surrounding flashing for water entry.",
                severity.as_str()
            ),
            location: "Chimney".to_string(),
            cost: CostBasis::Range(kind),
        }]
    }
}
