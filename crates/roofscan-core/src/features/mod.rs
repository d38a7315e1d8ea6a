//! Visual feature extraction.
//!
//! Computes a [`FeatureSummary`] from a decoded photo: sampled luminance
//! statistics, a red-dominance flag for rust, a condition grade, and a
//! local-contrast edge density for cracking and curling.

mod edges;
mod stats;

pub use edges::{count_edges, edge_density};
pub use stats::{luminance, LuminanceStats};

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::domain::{Condition, FeatureSummary};

/// Thresholds and sampling parameters for feature extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Longest side of the working bitmap in pixels.
    pub max_dimension: u32,
    /// Sample every Nth pixel in row-major order.
    pub sample_stride: usize,
    /// Pixels with luminance below this count as dark.
    pub dark_luminance: f64,
    /// Minimum red channel for a red-dominant pixel.
    pub red_min: u8,
    /// Red must exceed green and blue by this factor.
    pub red_dominance: f64,
    /// Fraction of red-dominant samples that flags red areas.
    pub red_area_fraction: f64,
    /// Darkness ratio above which dark spots are flagged.
    pub dark_spot_ratio: f64,
    /// Darkness ratio above which the condition is poor.
    pub poor_darkness: f64,
    /// Brightness below which the condition is poor.
    pub poor_brightness: f64,
    /// Darkness ratio above which the condition is fair.
    pub fair_darkness: f64,
    /// Brightness below which the condition is fair.
    pub fair_brightness: f64,
    /// Contrast below which the condition is fair.
    pub fair_contrast: f64,
    /// Column stride of the edge grid.
    pub edge_stride: usize,
    /// Luminance difference that counts as an edge.
    pub edge_delta: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_dimension: 640,
            sample_stride: 10,
            dark_luminance: 60.0,
            red_min: 120,
            red_dominance: 1.5,
            red_area_fraction: 0.05,
            dark_spot_ratio: 0.15,
            poor_darkness: 0.3,
            poor_brightness: 70.0,
            fair_darkness: 0.15,
            fair_brightness: 100.0,
            fair_contrast: 25.0,
            edge_stride: 4,
            edge_delta: 40.0,
        }
    }
}

/// Downscales an image so its longest side is at most `max_dimension`.
///
/// Aspect ratio is preserved and images are never upscaled.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn fit_working_size(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 || max_dimension == 0 {
        return image;
    }

    let max = f64::from(max_dimension);
    let scale = (max / f64::from(width)).min(max / f64::from(height));
    if scale >= 1.0 {
        return image;
    }

    // Safe: scale < 1 so results fit in u32
    let new_width = ((f64::from(width) * scale).floor() as u32).max(1);
    let new_height = ((f64::from(height) * scale).floor() as u32).max(1);
    image.resize_exact(new_width, new_height, image::imageops::FilterType::Triangle)
}

/// Computes feature summaries. Pure and deterministic.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    /// Creates an extractor with the given configuration.
    #[must_use]
    pub const fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Returns the extractor configuration.
    #[must_use]
    pub const fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Extracts features from a working-size RGB bitmap.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn extract(&self, image: &RgbImage) -> FeatureSummary {
        let cfg = &self.config;
        let stride = cfg.sample_stride.max(1);
        let pixel_count = image.as_raw().len() / 3;

        let mut stats = LuminanceStats::with_capacity(pixel_count / stride + 1);
        let mut red_pixels = 0usize;

        for px in image.as_raw().chunks_exact(3).step_by(stride) {
            let rgb = [px[0], px[1], px[2]];
            stats.push(luminance(rgb));
            if self.is_red_dominant(rgb) {
                red_pixels += 1;
            }
        }

        let brightness = stats.mean();
        let darkness = stats.fraction_below(cfg.dark_luminance);
        let contrast = stats.std_dev();
        let red_fraction = if stats.count() == 0 {
            0.0
        } else {
            red_pixels as f64 / stats.count() as f64
        };

        let edges = count_edges(image, cfg.edge_stride, cfg.edge_delta);

        FeatureSummary {
            brightness,
            darkness,
            contrast,
            has_red_areas: red_fraction > cfg.red_area_fraction,
            has_dark_spots: darkness > cfg.dark_spot_ratio,
            overall_condition: self.grade(brightness, darkness, contrast),
            edge_density: edge_density(edges, image.width(), image.height()),
        }
    }

    /// Resizes a decoded photo to working size and extracts its features.
    ///
    /// Returns the working bitmap alongside so the detector sees the same pixels.
    #[must_use]
    pub fn extract_from(&self, image: DynamicImage) -> (DynamicImage, FeatureSummary) {
        let working = fit_working_size(image, self.config.max_dimension);
        let features = self.extract(&working.to_rgb8());
        (working, features)
    }

    fn is_red_dominant(&self, [r, g, b]: [u8; 3]) -> bool {
        let cfg = &self.config;
        let r = f64::from(r);
        r > f64::from(cfg.red_min)
            && r > f64::from(g) * cfg.red_dominance
            && r > f64::from(b) * cfg.red_dominance
    }

    fn grade(&self, brightness: f64, darkness: f64, contrast: f64) -> Condition {
        let cfg = &self.config;
        if darkness > cfg.poor_darkness || brightness < cfg.poor_brightness {
            Condition::Poor
        } else if darkness > cfg.fair_darkness
            || brightness < cfg.fair_brightness
            || contrast < cfg.fair_contrast
        {
            Condition::Fair
        } else {
            Condition::Good
        }
    }
}
