//! Damage findings and the aggregate analysis report.

use serde::{Deserialize, Serialize};

use super::{DamageKind, Severity};

/// Category of the finding emitted when the whole run fails.
pub const MANUAL_REVIEW_CATEGORY: &str = "Manual Review Required";

/// Category of the finding emitted when no photo produced a finding.
pub const NO_DAMAGE_CATEGORY: &str = "AI Analysis Complete";

/// How a finding draft should be priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostBasis {
    /// Sample a cost from the pricing table range for this kind.
    Range(DamageKind),
    /// Use this exact amount.
    Fixed(u32),
}

/// A finding produced by a classifier, before pricing and id assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct FindingDraft {
    /// Report category (e.g. "Asphalt Shingles").
    pub category: String,
    /// Severity tier.
    pub severity: Severity,
    /// Narrative for the report.
    pub description: String,
    /// Where on the roof the issue is.
    pub location: String,
    /// Pricing basis.
    pub cost: CostBasis,
}

/// A single reported damage item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageFinding {
    /// Unique, monotonically increasing within a run (starting at 1).
    pub id: u32,
    /// Report category.
    pub category: String,
    /// Severity tier.
    pub severity: Severity,
    /// Narrative for the report.
    pub description: String,
    /// Estimated repair cost in whole dollars.
    pub estimated_cost: u32,
    /// Where on the roof the issue is.
    pub location: String,
    /// Pricing table entry the cost was drawn from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_kind: Option<DamageKind>,
}

/// A photo that contributed no findings because it failed to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPhoto {
    /// Position in the submitted batch (0-based).
    pub index: usize,
    /// Photo label.
    pub label: String,
    /// Error message.
    pub reason: String,
}

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageAnalysis {
    /// Findings in photo order.
    pub findings: Vec<DamageFinding>,
    /// Sum of all findings' estimated costs.
    pub total_estimate: u64,
    /// Photos that failed to process.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedPhoto>,
    /// Provenance of the cost figures.
    pub pricing_source: String,
    /// True when the run failed and findings must be entered manually.
    #[serde(default)]
    pub manual_review: bool,
}

impl DamageAnalysis {
    /// Builds an analysis, computing the total from the findings.
    #[must_use]
    pub fn new(
        findings: Vec<DamageFinding>,
        skipped: Vec<SkippedPhoto>,
        pricing_source: impl Into<String>,
    ) -> Self {
        let total_estimate = findings.iter().map(|f| u64::from(f.estimated_cost)).sum();
        Self {
            findings,
            total_estimate,
            skipped,
            pricing_source: pricing_source.into(),
            manual_review: false,
        }
    }

    /// The degraded result returned when the whole run fails.
    #[must_use]
    pub fn manual_review(pricing_source: impl Into<String>) -> Self {
        let finding = DamageFinding {
            id: 1,
            category: MANUAL_REVIEW_CATEGORY.to_string(),
            severity: Severity::Minor,
            description: "Automated analysis could not process the submitted photos. This can \
                happen when the object detection model fails to load. Add findings manually \
                or retry the analysis."
                .to_string(),
            estimated_cost: 0,
            location: "N/A".to_string(),
            cost_kind: None,
        };
        Self {
            manual_review: true,
            ..Self::new(vec![finding], Vec::new(), pricing_source)
        }
    }

    /// Returns true if any finding carries a cost or is more than minor.
    #[must_use]
    pub fn has_damage(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.estimated_cost > 0 || f.severity > Severity::Minor)
    }

    /// Returns the highest severity across all findings.
    #[must_use]
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}

/// The finding appended when a run completes without any finding.
#[must_use]
pub fn no_damage_draft() -> FindingDraft {
    FindingDraft {
        category: NO_DAMAGE_CATEGORY.to_string(),
        severity: Severity::Minor,
        description: "Computer vision analysis completed. No significant damage patterns were \
            detected in the submitted photos. The roof system appears to be in acceptable \
            condition; regular maintenance and annual inspections are recommended."
            .to_string(),
        location: "Overall".to_string(),
        cost: CostBasis::Fixed(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(id: u32, severity: Severity, cost: u32) -> DamageFinding {
        DamageFinding {
            id,
            category: "Test".into(),
            severity,
            description: String::new(),
            estimated_cost: cost,
            location: String::new(),
            cost_kind: None,
        }
    }

    #[test]
    fn test_total_is_exact_sum() {
        let analysis = DamageAnalysis::new(
            vec![
                finding(1, Severity::Minor, 400),
                finding(2, Severity::Severe, 30_000),
                finding(3, Severity::Moderate, 1_234),
            ],
            vec![],
            "test",
        );
        assert_eq!(analysis.total_estimate, 31_634);
        assert_eq!(analysis.max_severity(), Some(Severity::Severe));
    }

    #[test]
    fn test_total_does_not_overflow_u32() {
        let analysis = DamageAnalysis::new(
            vec![finding(1, Severity::Severe, u32::MAX), finding(2, Severity::Severe, u32::MAX)],
            vec![],
            "test",
        );
        assert_eq!(analysis.total_estimate, 2 * u64::from(u32::MAX));
    }

    #[test]
    fn test_manual_review_result() {
        let analysis = DamageAnalysis::manual_review("defaults");
        assert!(analysis.manual_review);
        assert_eq!(analysis.findings.len(), 1);
        assert_eq!(analysis.findings[0].category, MANUAL_REVIEW_CATEGORY);
        assert_eq!(analysis.findings[0].estimated_cost, 0);
        assert_eq!(analysis.total_estimate, 0);
    }

    #[test]
    fn test_has_damage() {
        let clean = DamageAnalysis::new(vec![finding(1, Severity::Minor, 0)], vec![], "t");
        assert!(!clean.has_damage());

        let priced = DamageAnalysis::new(vec![finding(1, Severity::Minor, 500)], vec![], "t");
        assert!(priced.has_damage());
    }

    #[test]
    fn test_serialization_skips_empty_diagnostics() {
        let analysis = DamageAnalysis::new(vec![finding(1, Severity::Minor, 0)], vec![], "t");
        let json = serde_json::to_value(&analysis).unwrap_or_default();
        assert!(json.get("skipped").is_none());
        assert!(json["findings"][0].get("cost_kind").is_none());
        assert_eq!(json["findings"][0]["severity"], "minor");
    }
}
