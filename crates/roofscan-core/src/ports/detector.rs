//! Object detector port.

use crate::domain::Detection;

/// A general-purpose object detector.
///
/// Detections are advisory: classifiers use them as a secondary signal only.
pub trait ObjectDetector: Send + Sync {
    /// Returns the name of this detector.
    fn name(&self) -> &'static str;

    /// Detects objects in a working-size bitmap.
    ///
    /// Bounding boxes are in the pixel coordinates of `image`.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn detect(&self, image: &image::DynamicImage) -> anyhow::Result<Vec<Detection>>;
}

/// Detector that never finds anything. Used when no model is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDetector;

impl ObjectDetector for NullDetector {
    fn name(&self) -> &'static str {
        "null"
    }

    fn detect(&self, _image: &image::DynamicImage) -> anyhow::Result<Vec<Detection>> {
        Ok(Vec::new())
    }
}
