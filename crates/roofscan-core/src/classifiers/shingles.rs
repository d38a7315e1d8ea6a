//! Shingle field classifier.

use super::{percent, ClassifierInput, DamageClassifier};
use crate::domain::{Condition, CostBasis, DamageKind, FindingDraft, Severity};

/// Looks for missing shingles, cracking and general surface wear.
///
/// Also handles photos the inspector tagged as `damage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShingleClassifier;

impl DamageClassifier for ShingleClassifier {
    fn name(&self) -> &'static str {
        "shingles"
    }

    fn classify(&self, input: &ClassifierInput<'_>) -> Vec<FindingDraft> {
        let features = input.features;
        let policy = input.policy;
        let mut drafts = Vec::new();

        if features.has_dark_spots || features.darkness > policy.shingle_dark_trigger {
            let (severity, kind) = if features.darkness > policy.shingle_severe_darkness {
                (Severity::Severe, DamageKind::SevereDamage)
            } else if features.darkness > policy.shingle_moderate_darkness {
                (Severity::Moderate, DamageKind::DamagedArea)
            } else {
                (Severity::Minor, DamageKind::MissingShingles)
            };

            let extent = if severity == Severity::Severe {
                "extensive missing or badly damaged"
            } else {
                "possibly missing or damaged"
            };
            let advice = match severity {
                Severity::Severe => "Immediate attention required; the deck may be exposed.",
                Severity::Moderate => "Prompt repair recommended to keep water out.",
                Severity::Minor => "Close inspection and spot repair recommended.",
            };

            drafts.push(FindingDraft {
                category: "Asphalt Shingles".to_string(),
                severity,
                description: format!(
                    "{}% of the sampled surface is dark, pointing to {extent} shingles from wind \
                     uplift or age-related loss. {advice}",
                    percent(features.darkness)
                ),
                location: "Main roof section".to_string(),
                cost: CostBasis::Range(kind),
            });
        }

        if features.edge_density > policy.edge_minor {
            let advanced = features.edge_density > policy.edge_moderate;
            let (severity, kind, pattern, advice) = if advanced {
                (
                    Severity::Moderate,
                    DamageKind::DamagedArea,
                    "dense",
                    "Assess for section repair or replacement.",
                )
            } else {
                (
                    Severity::Minor,
                    DamageKind::MinorWear,
                    "elevated",
                    "Monitor for progression and consider preventive repairs.",
                )
            };

            drafts.push(FindingDraft {
                category: "Shingle Deterioration".to_string(),
                severity,
                description: format!(
                    "Edge analysis found {pattern} crack and curl patterns ({:.1} per 1000 px), \
                     typical of thermal cycling and UV exposure. {advice}",
                    features.edge_density
                ),
                location: "Multiple sections".to_string(),
                cost: CostBasis::Range(kind),
            });
        }

        if drafts.is_empty() && features.overall_condition == Condition::Poor {
            let severe = features.darkness > policy.severe_darkness
                || features.brightness < policy.severe_brightness;
            let (severity, kind, detail) = if severe {
                (
                    Severity::Severe,
                    DamageKind::FullReplacementLarge,
                    "critical age-related degradation; a full replacement assessment is needed",
                )
            } else {
                (
                    Severity::Moderate,
                    DamageKind::DamagedArea,
                    "age-related degradation; a professional should weigh repair against \
                     replacement",
                )
            };

            drafts.push(FindingDraft {
                category: "Roof Condition".to_string(),
                severity,
                description: format!(
                    "Surface analysis shows {} wear with {detail}.",
                    severity.as_str()
                ),
                location: "Overall roof surface".to_string(),
                cost: CostBasis::Range(kind),
            });
        }

        drafts
    }
}
