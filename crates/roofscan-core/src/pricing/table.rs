//! Cost ranges per damage kind with provenance.

use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info};

use super::MarketCosts;
use crate::domain::{CostRange, DamageKind, Severity};
use crate::error::AnalysisError;
use crate::ports::PricingSource;

/// Provenance label of the built-in table.
pub const DEFAULT_SOURCE_LABEL: &str = "Industry average (2025)";

/// Current cost-range lookup, either built-in or derived from market data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingTable {
    ranges: BTreeMap<DamageKind, CostRange>,
    source_label: String,
    #[serde(with = "time::serde::rfc3339::option")]
    last_updated: Option<OffsetDateTime>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::default_table()
    }
}

impl PricingTable {
    /// Returns the built-in table. Always available.
    #[must_use]
    pub fn default_table() -> Self {
        Self {
            ranges: DamageKind::ALL
                .iter()
                .map(|&kind| (kind, kind.default_range()))
                .collect(),
            source_label: DEFAULT_SOURCE_LABEL.to_string(),
            last_updated: None,
        }
    }

    /// Derives a table from a market cost document.
    ///
    /// Ranges are computed from the per-square-foot average (lower bound) and
    /// maximum (upper bound) against the small/medium/large roof tiers. Small
    /// jobs are priced against a 6 $/sq ft baseline.
    ///
    /// # Errors
    ///
    /// Returns `PricingUnavailable` if the document is invalid or a derived range
    /// does not fit in whole dollars.
    pub fn from_market_costs(costs: &MarketCosts) -> Result<Self, AnalysisError> {
        let last_updated = costs.validate()?;

        let avg = costs.per_sq_ft.average;
        let max = costs.per_sq_ft.max;
        let size = &costs.typical_roof_size;
        let full = &costs.full_replacement;

        let derived = [
            (
                DamageKind::MissingShingles,
                size.small * 0.1 * avg,
                size.small * 0.15 * max,
                Severity::Moderate,
            ),
            (
                DamageKind::DamagedArea,
                size.small * 0.3 * avg,
                size.medium * 0.4 * max,
                Severity::Moderate,
            ),
            (
                DamageKind::SevereDamage,
                size.medium * 0.5 * avg,
                size.medium * 0.8 * max,
                Severity::Severe,
            ),
            (
                DamageKind::FullReplacement,
                full.medium.min,
                full.large.max,
                Severity::Severe,
            ),
            (
                DamageKind::FullReplacementLarge,
                full.large.min,
                size.large * max,
                Severity::Severe,
            ),
            (
                DamageKind::MinorWear,
                500.0 * avg / 6.0,
                1000.0 * max / 6.0,
                Severity::Minor,
            ),
            (
                DamageKind::Weathering,
                600.0 * avg / 6.0,
                1500.0 * max / 6.0,
                Severity::Minor,
            ),
            (
                DamageKind::StructuralConcern,
                size.small * 0.6 * avg,
                size.medium * 0.8 * max,
                Severity::Severe,
            ),
            (
                DamageKind::GutterIssue,
                400.0 * avg / 6.0,
                1200.0 * max / 6.0,
                Severity::Minor,
            ),
            (
                DamageKind::FlashingConcern,
                1200.0 * avg / 6.0,
                3500.0 * max / 6.0,
                Severity::Moderate,
            ),
        ];

        let mut ranges = BTreeMap::new();
        for (kind, lo, hi, severity) in derived {
            let range = CostRange::new(to_dollars(kind, lo)?, to_dollars(kind, hi)?, severity);
            if range.min > range.max {
                return Err(AnalysisError::PricingUnavailable(format!(
                    "derived range for {kind:?} is inverted ({} > {})",
                    range.min, range.max
                )));
            }
            ranges.insert(kind, range);
        }

        Ok(Self {
            ranges,
            source_label: costs.source.clone(),
            last_updated: Some(last_updated),
        })
    }

    /// Replaces the table with one derived from `source`.
    ///
    /// Does nothing and returns `Ok(false)` if the table was already refreshed.
    /// On failure the current table is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `PricingUnavailable` if the source fails or returns invalid data.
    pub fn refresh(&mut self, source: &dyn PricingSource) -> Result<bool, AnalysisError> {
        if self.last_updated.is_some() {
            debug!("Pricing table already refreshed from {}", self.source_label);
            return Ok(false);
        }

        let costs = source
            .fetch()
            .map_err(|e| AnalysisError::PricingUnavailable(format!("{e:#}")))?;
        let table = Self::from_market_costs(&costs)?;

        info!(
            "Updated cost estimates from {} ({})",
            source.describe(),
            table.source_label
        );
        *self = table;
        Ok(true)
    }

    /// Returns the cost range for a damage kind.
    #[must_use]
    pub fn range(&self, kind: DamageKind) -> CostRange {
        self.ranges
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_range())
    }

    /// Provenance label (e.g. "Industry average (2025)").
    #[must_use]
    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    /// When the market data was last updated, if the table has been refreshed.
    #[must_use]
    pub const fn last_updated(&self) -> Option<OffsetDateTime> {
        self.last_updated
    }

    /// Returns true if the table holds refreshed market data.
    #[must_use]
    pub const fn is_refreshed(&self) -> bool {
        self.last_updated.is_some()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_dollars(kind: DamageKind, value: f64) -> Result<u32, AnalysisError> {
    let rounded = value.round();
    if rounded.is_finite() && (0.0..=f64::from(u32::MAX)).contains(&rounded) {
        // Safe: range-checked above
        Ok(rounded as u32)
    } else {
        Err(AnalysisError::PricingUnavailable(format!(
            "derived cost for {kind:?} is out of range: {value}"
        )))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    struct StaticSource(Option<MarketCosts>);

    impl PricingSource for StaticSource {
        fn describe(&self) -> String {
            "static".into()
        }

        fn fetch(&self) -> anyhow::Result<MarketCosts> {
            self.0.clone().ok_or_else(|| anyhow::anyhow!("offline"))
        }
    }

    fn market() -> MarketCosts {
        MarketCosts::industry_average(OffsetDateTime::UNIX_EPOCH)
    }

    #[test]
    fn test_default_table_matches_builtin_ranges() {
        let table = PricingTable::default_table();
        assert_eq!(table.source_label(), DEFAULT_SOURCE_LABEL);
        assert!(!table.is_refreshed());
        let range = table.range(DamageKind::SevereDamage);
        assert_eq!((range.min, range.max), (8000, 15000));
        assert_eq!(range.default_severity, Severity::Severe);
    }

    #[test]
    fn test_derivation_from_industry_average() {
        let table = PricingTable::from_market_costs(&market()).expect("derive");

        // 1500 * 0.1 * 6.5 = 975, 1500 * 0.15 * 8.5 = 1912.5 -> 1913
        assert_eq!(
            table.range(DamageKind::MissingShingles),
            CostRange::new(975, 1913, Severity::Moderate)
        );
        // medium.min, large.max
        assert_eq!(
            table.range(DamageKind::FullReplacement),
            CostRange::new(10000, 21250, Severity::Severe)
        );
        // large.min, 2500 * 8.5
        assert_eq!(
            table.range(DamageKind::FullReplacementLarge),
            CostRange::new(12500, 21250, Severity::Severe)
        );
        // 400 * 6.5 / 6 = 433.3, 1200 * 8.5 / 6 = 1700
        assert_eq!(
            table.range(DamageKind::GutterIssue),
            CostRange::new(433, 1700, Severity::Minor)
        );
        assert_eq!(table.source_label(), "Industry data (1970)");
        assert_eq!(table.last_updated(), Some(OffsetDateTime::UNIX_EPOCH));
    }

    #[test]
    fn test_every_derived_range_is_ordered() {
        let table = PricingTable::from_market_costs(&market()).expect("derive");
        for kind in DamageKind::ALL {
            let range = table.range(kind);
            assert!(range.min <= range.max, "{kind:?}: {range:?}");
        }
    }

    #[test]
    fn test_inverted_derivation_is_rejected() {
        let mut costs = market();
        // large.min above large sq ft * max per sq ft
        costs.full_replacement.large.min = 50_000.0;
        costs.full_replacement.large.max = 60_000.0;
        let err = PricingTable::from_market_costs(&costs).expect_err("inverted");
        assert!(err.to_string().contains("FullReplacementLarge"));
    }

    #[test]
    fn test_refresh_updates_once() {
        let mut table = PricingTable::default_table();
        let source = StaticSource(Some(market()));

        assert!(table.refresh(&source).expect("first refresh"));
        assert!(table.is_refreshed());

        let snapshot = table.clone();
        assert!(!table.refresh(&source).expect("second refresh is a no-op"));
        assert_eq!(table, snapshot);
    }

    #[test]
    fn test_refresh_failure_leaves_table_untouched() {
        let mut table = PricingTable::default_table();
        let err = table
            .refresh(&StaticSource(None))
            .expect_err("offline source");
        assert!(matches!(err, AnalysisError::PricingUnavailable(_)));
        assert_eq!(table, PricingTable::default_table());
    }

    #[test]
    fn test_serializes_provenance() {
        let table = PricingTable::default_table();
        let json = serde_json::to_value(&table).expect("serialize");
        assert_eq!(json["source_label"], DEFAULT_SOURCE_LABEL);
        assert!(json["last_updated"].is_null());
        assert_eq!(json["ranges"]["gutter_issue"]["min"], 400);
    }
}
