//! Vent classifier.

use super::{ClassifierInput, DamageClassifier};
use crate::domain::{CostBasis, DamageKind, FindingDraft, Severity};

/// Emits a maintenance note for every vent photo.
#[derive(Debug, Clone, Copy, Default)]
pub struct VentClassifier;

impl DamageClassifier for VentClassifier {
    fn name(&self) -> &'static str {
        "vents"
    }

    fn classify(&self, _input: &ClassifierInput<'_>) -> Vec<FindingDraft> {
        vec![FindingDraft {
            category: "Roof Ventilation".to_string(),
            severity: Severity::Minor,
            description: "Ventilation components visible. Confirm the seals around each \
                penetration and check that intake and exhaust airflow are balanced."
                .to_string(),
            location: "Roof penetrations".to_string(),
            cost: CostBasis::Range(DamageKind::MinorWear),
        }]
    }
}
