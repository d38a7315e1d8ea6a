//! Object detector output.

use serde::{Deserialize, Serialize};

/// Bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X coordinate of top-left corner.
    pub x: u32,
    /// Y coordinate of top-left corner.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Creates a new bounding box.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box area in pixels.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// An object found by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Object location in the working bitmap.
    pub bbox: BoundingBox,
    /// Class label.
    pub label: String,
    /// Confidence score (0.0 to 1.0).
    pub confidence: f32,
}

impl Detection {
    /// Returns true if the detection's confidence is strictly above `min`.
    #[must_use]
    pub fn is_confident(&self, min: f32) -> bool {
        self.confidence > min
    }
}

/// Counts detections whose confidence is strictly above `min`.
#[must_use]
pub fn count_confident(detections: &[Detection], min: f32) -> usize {
    detections.iter().filter(|d| d.is_confident(min)).count()
}
