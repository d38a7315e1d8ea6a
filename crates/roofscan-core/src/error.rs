//! Error taxonomy for the damage-analysis pipeline.
//!
//! Per-photo errors (`ImageDecode`, `PhotoRead`, `Detection`) are absorbed by the
//! session and recorded as skipped photos. `DetectorUnavailable` aborts the run
//! into the manual-review fallback. `PricingUnavailable` is logged and ignored.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised inside the analysis pipeline.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Photo bytes could not be decoded into a bitmap.
    #[error("failed to decode photo: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Photo file could not be opened.
    #[error("failed to read photo {}: {source}", path.display())]
    PhotoRead {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The object detector failed to load or initialize.
    #[error("object detector unavailable: {0}")]
    DetectorUnavailable(String),

    /// The object detector failed on a single photo.
    #[error("object detection failed: {0}")]
    Detection(String),

    /// Pricing data could not be fetched or was malformed.
    #[error("pricing data unavailable: {0}")]
    PricingUnavailable(String),

    /// The run produced no findings. Guarded by the no-damage fallback.
    #[error("analysis produced no findings")]
    EmptyResult,
}

impl AnalysisError {
    /// Returns true if this error only affects the photo it was raised for.
    #[must_use]
    pub const fn is_per_photo(&self) -> bool {
        matches!(
            self,
            Self::ImageDecode(_) | Self::PhotoRead { .. } | Self::Detection(_)
        )
    }
}
