//! Market cost documents supplied by pricing sources.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::AnalysisError;

/// Installed cost per square foot in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerSqFt {
    /// Low end.
    pub min: f64,
    /// High end.
    pub max: f64,
    /// Typical.
    pub average: f64,
}

/// Typical roof areas in square feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoofSizes {
    /// Small residential roof.
    pub small: f64,
    /// Medium residential roof.
    pub medium: f64,
    /// Large residential roof.
    pub large: f64,
}

/// A dollar range as published by the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DollarRange {
    /// Low end.
    pub min: f64,
    /// High end.
    pub max: f64,
}

/// Full replacement cost per roof size tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplacementTiers {
    /// Small roof.
    pub small: DollarRange,
    /// Medium roof.
    pub medium: DollarRange,
    /// Large roof.
    pub large: DollarRange,
}

/// Per-area roofing cost data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketCosts {
    /// Cost per square foot.
    pub per_sq_ft: PerSqFt,
    /// Typical roof areas.
    pub typical_roof_size: RoofSizes,
    /// Full replacement ranges.
    pub full_replacement: ReplacementTiers,
    /// When the data was last updated (RFC 3339).
    pub last_updated: String,
    /// Human-readable provenance.
    pub source: String,
}

/// Pricing endpoints wrap the document in a `{ success, data }` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum PricingDocument {
    Envelope {
        success: bool,
        data: Option<MarketCosts>,
        #[serde(default)]
        error: Option<String>,
    },
    Bare(MarketCosts),
}

impl MarketCosts {
    /// Researched industry averages, used when no live source is reachable.
    #[must_use]
    pub fn industry_average(last_updated: OffsetDateTime) -> Self {
        Self {
            per_sq_ft: PerSqFt {
                min: 5.0,
                max: 8.5,
                average: 6.5,
            },
            typical_roof_size: RoofSizes {
                small: 1500.0,
                medium: 2000.0,
                large: 2500.0,
            },
            full_replacement: ReplacementTiers {
                small: DollarRange {
                    min: 7500.0,
                    max: 12750.0,
                },
                medium: DollarRange {
                    min: 10000.0,
                    max: 17000.0,
                },
                large: DollarRange {
                    min: 12500.0,
                    max: 21250.0,
                },
            },
            last_updated: last_updated
                .format(&Rfc3339)
                .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z")),
            source: format!("Industry data ({})", last_updated.year()),
        }
    }

    /// Parses a pricing document, bare or wrapped in a `{ success, data }` envelope.
    ///
    /// # Errors
    ///
    /// Returns `PricingUnavailable` if the JSON is malformed, the envelope reports
    /// failure, or the document fails validation.
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let document: PricingDocument = serde_json::from_str(json)
            .map_err(|e| AnalysisError::PricingUnavailable(format!("malformed document: {e}")))?;

        let costs = match document {
            PricingDocument::Envelope {
                success: true,
                data: Some(data),
                ..
            } => data,
            PricingDocument::Envelope { error, .. } => {
                return Err(AnalysisError::PricingUnavailable(
                    error.unwrap_or_else(|| "source reported failure".to_string()),
                ));
            }
            PricingDocument::Bare(costs) => costs,
        };

        costs.validate()?;
        Ok(costs)
    }

    /// Checks the document for values that would produce nonsense ranges.
    ///
    /// Returns the parsed `last_updated` timestamp on success.
    ///
    /// # Errors
    ///
    /// Returns `PricingUnavailable` describing the first invalid field.
    pub fn validate(&self) -> Result<OffsetDateTime, AnalysisError> {
        let p = &self.per_sq_ft;
        positive("perSqFt.min", p.min)?;
        positive("perSqFt.max", p.max)?;
        positive("perSqFt.average", p.average)?;
        ordered("perSqFt", p.min, p.max)?;

        let s = &self.typical_roof_size;
        positive("typicalRoofSize.small", s.small)?;
        positive("typicalRoofSize.medium", s.medium)?;
        positive("typicalRoofSize.large", s.large)?;

        let tiers = [
            ("fullReplacement.small", self.full_replacement.small),
            ("fullReplacement.medium", self.full_replacement.medium),
            ("fullReplacement.large", self.full_replacement.large),
        ];
        for (name, range) in tiers {
            positive(name, range.min)?;
            positive(name, range.max)?;
            ordered(name, range.min, range.max)?;
        }

        if self.source.trim().is_empty() {
            return Err(AnalysisError::PricingUnavailable(
                "source label is empty".to_string(),
            ));
        }

        OffsetDateTime::parse(&self.last_updated, &Rfc3339).map_err(|e| {
            AnalysisError::PricingUnavailable(format!(
                "lastUpdated '{}' is not RFC 3339: {e}",
                self.last_updated
            ))
        })
    }
}

fn positive(field: &str, value: f64) -> Result<(), AnalysisError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::PricingUnavailable(format!(
            "{field} must be a positive number, got {value}"
        )))
    }
}

fn ordered(field: &str, min: f64, max: f64) -> Result<(), AnalysisError> {
    if min <= max {
        Ok(())
    } else {
        Err(AnalysisError::PricingUnavailable(format!(
            "{field}: min {min} exceeds max {max}"
        )))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    const BARE: &str = r#"{
        "perSqFt": {"min": 5.0, "max": 8.5, "average": 6.5},
        "typicalRoofSize": {"small": 1500, "medium": 2000, "large": 2500},
        "fullReplacement": {
            "small": {"min": 7500, "max": 12750},
            "medium": {"min": 10000, "max": 17000},
            "large": {"min": 12500, "max": 21250}
        },
        "lastUpdated": "2025-06-01T00:00:00Z",
        "source": "Industry data (2025)"
    }"#;

    #[test]
    fn test_parse_bare_document() {
        let costs = MarketCosts::from_json(BARE).expect("valid document");
        assert!((costs.per_sq_ft.average - 6.5).abs() < f64::EPSILON);
        assert_eq!(costs.source, "Industry data (2025)");
    }

    #[test]
    fn test_parse_envelope() {
        let json = format!(r#"{{"success": true, "data": {BARE}}}"#);
        let costs = MarketCosts::from_json(&json).expect("valid envelope");
        assert!((costs.typical_roof_size.large - 2500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failed_envelope_is_rejected_even_with_data() {
        let json = format!(r#"{{"success": false, "error": "upstream down", "data": {BARE}}}"#);
        let err = MarketCosts::from_json(&json).expect_err("failure envelope");
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(MarketCosts::from_json("{not json").is_err());
        assert!(MarketCosts::from_json(r#"{"perSqFt": 3}"#).is_err());
        assert!(MarketCosts::from_json("null").is_err());
    }

    #[test]
    fn test_negative_cost_is_rejected() {
        let json = BARE.replace(r#""average": 6.5"#, r#""average": -1"#);
        let err = MarketCosts::from_json(&json).expect_err("negative average");
        assert!(err.to_string().contains("perSqFt.average"));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let json = BARE.replace(
            r#""large": {"min": 12500, "max": 21250}"#,
            r#""large": {"min": 30000, "max": 21250}"#,
        );
        let err = MarketCosts::from_json(&json).expect_err("inverted tier");
        assert!(err.to_string().contains("fullReplacement.large"));
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let json = BARE.replace("2025-06-01T00:00:00Z", "last tuesday");
        assert!(MarketCosts::from_json(&json).is_err());
    }

    #[test]
    fn test_industry_average_validates() {
        let costs = MarketCosts::industry_average(OffsetDateTime::UNIX_EPOCH);
        let updated = costs.validate().expect("fallback data must be valid");
        assert_eq!(updated, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(costs.source, "Industry data (1970)");
    }
}
