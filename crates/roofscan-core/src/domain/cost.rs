//! Damage kinds and their cost ranges.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity tier of a finding. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Cosmetic or maintenance-level issue.
    Minor,
    /// Repair recommended.
    Moderate,
    /// Immediate attention required.
    Severe,
}

impl Severity {
    /// Returns the lowercase name used in narratives.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repair categories the pricing table holds a cost range for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    /// Partial shingle repair.
    MissingShingles,
    /// Section replacement.
    DamagedArea,
    /// Major repairs.
    SevereDamage,
    /// Complete roof replacement.
    FullReplacement,
    /// Complete replacement of a large or complex roof.
    FullReplacementLarge,
    /// Minor repairs.
    MinorWear,
    /// Cleaning or surface treatment.
    Weathering,
    /// Structural repairs.
    StructuralConcern,
    /// Gutter repair or cleaning.
    GutterIssue,
    /// Flashing replacement.
    FlashingConcern,
}

impl DamageKind {
    /// Every damage kind.
    pub const ALL: [Self; 10] = [
        Self::MissingShingles,
        Self::DamagedArea,
        Self::SevereDamage,
        Self::FullReplacement,
        Self::FullReplacementLarge,
        Self::MinorWear,
        Self::Weathering,
        Self::StructuralConcern,
        Self::GutterIssue,
        Self::FlashingConcern,
    ];

    /// Built-in cost range used when no market data has been loaded.
    #[must_use]
    pub const fn default_range(self) -> CostRange {
        match self {
            Self::MissingShingles => CostRange::new(800, 2200, Severity::Moderate),
            Self::DamagedArea => CostRange::new(3500, 7500, Severity::Moderate),
            Self::SevereDamage => CostRange::new(8000, 15000, Severity::Severe),
            Self::FullReplacement => CostRange::new(12000, 28000, Severity::Severe),
            Self::FullReplacementLarge => CostRange::new(18000, 35000, Severity::Severe),
            Self::MinorWear => CostRange::new(400, 1200, Severity::Minor),
            Self::Weathering => CostRange::new(600, 1500, Severity::Minor),
            Self::StructuralConcern => CostRange::new(6000, 14000, Severity::Severe),
            Self::GutterIssue => CostRange::new(400, 1200, Severity::Minor),
            Self::FlashingConcern => CostRange::new(1200, 3500, Severity::Moderate),
        }
    }
}

/// Cost range in whole dollars for one damage kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRange {
    /// Lower bound (inclusive).
    pub min: u32,
    /// Upper bound (inclusive).
    pub max: u32,
    /// Severity this repair is usually associated with.
    pub default_severity: Severity,
}

impl CostRange {
    /// Creates a cost range.
    #[must_use]
    pub const fn new(min: u32, max: u32, default_severity: Severity) -> Self {
        Self {
            min,
            max,
            default_severity,
        }
    }

    /// Returns true if `cost` lies within `[min, max]`.
    #[must_use]
    pub const fn contains(&self, cost: u32) -> bool {
        cost >= self.min && cost <= self.max
    }
}

impl fmt::Display for CostRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}-${}", group_thousands(self.min), group_thousands(self.max))
    }
}

/// Formats a dollar amount with comma thousands separators.
#[must_use]
pub fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
