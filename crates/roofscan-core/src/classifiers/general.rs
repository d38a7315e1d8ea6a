//! Whole-roof assessment.

use std::fmt::Write as _;

use super::{ClassifierInput, DamageClassifier};
use crate::domain::{Condition, CostBasis, DamageKind, FindingDraft, Severity};

/// Estimates age and remaining life from the overall condition grade.
///
/// Always produces exactly one finding.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralClassifier;

impl DamageClassifier for GeneralClassifier {
    fn name(&self) -> &'static str {
        "general"
    }

    fn classify(&self, input: &ClassifierInput<'_>) -> Vec<FindingDraft> {
        let features = input.features;
        let policy = input.policy;
        let condition = features.overall_condition;

        let (age, remaining) = match condition {
            Condition::Poor => ("18-25", "2-5"),
            Condition::Fair => ("12-18", "5-10"),
            Condition::Good => ("5-12", "10-15"),
        };

        let (severity, cost) = match condition {
            Condition::Poor => {
                if features.darkness > policy.severe_darkness
                    || features.brightness < policy.severe_brightness
                {
                    (
                        Severity::Severe,
                        CostBasis::Range(DamageKind::FullReplacementLarge),
                    )
                } else {
                    (Severity::Moderate, CostBasis::Range(DamageKind::DamagedArea))
                }
            }
            Condition::Fair => (Severity::Minor, CostBasis::Fixed(policy.fair_condition_cost)),
            Condition::Good => (Severity::Minor, CostBasis::Fixed(0)),
        };

        let mut description = format!(
            "Estimated roof age {age} years from surface condition and weathering. Projected \
             remaining life {remaining} years with proper maintenance. Overall condition: {}. ",
            condition.as_str()
        );
        if features.edge_density > policy.general_edge_note {
            description.push_str("Elevated crack and wear patterns detected. ");
        }
        match (condition, severity) {
            (Condition::Poor, Severity::Severe) => {
                let range = input.pricing.range(DamageKind::FullReplacementLarge);
                let _ = write!(
                    description,
                    "Full replacement recommended, typically {range} for a residential roof ({}).",
                    input.pricing.source_label()
                );
            }
            (Condition::Poor, _) => {
                let range = input.pricing.range(DamageKind::DamagedArea);
                let _ = write!(
                    description,
                    "Professional inspection strongly recommended; section repairs typically \
                     run {range}."
                );
            }
            (Condition::Fair, _) => description.push_str("Regular monitoring recommended."),
            (Condition::Good, _) => description.push_str("Continue normal maintenance."),
        }

        vec![FindingDraft {
            category: "Overall Assessment".to_string(),
            severity,
            description,
            location: "Entire roof system".to_string(),
            cost,
        }]
    }
}
