//! Visual feature summary of a single photo.

use serde::{Deserialize, Serialize};

/// Coarse condition grade derived from the feature summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// No visual indicators of wear.
    Good,
    /// Some wear indicators.
    Fair,
    /// Strong wear indicators.
    Poor,
}

impl Condition {
    /// Returns the lowercase name used in finding narratives.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

/// Compact visual descriptors computed from a photo's sampled pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    /// Mean sampled luminance (0-255).
    pub brightness: f64,
    /// Fraction of sampled pixels below the dark luminance threshold (0-1).
    pub darkness: f64,
    /// Standard deviation of sampled luminance.
    pub contrast: f64,
    /// Enough red-dominant pixels to suggest rust or exposed metal.
    pub has_red_areas: bool,
    /// Darkness ratio above the dark-spot threshold.
    pub has_dark_spots: bool,
    /// Condition grade.
    pub overall_condition: Condition,
    /// Edge pixels per thousand pixels of image area.
    pub edge_density: f64,
}
