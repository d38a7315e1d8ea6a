//! Synthetic roof photos for testing.
//!
//! All builders produce images no larger than the default working size, so
//! the pipeline analyzes them pixel for pixel without resampling.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use roofscan_core::domain::{PhotoCategory, PhotoInput};

/// Light shingle tone.
pub const LIGHT: u8 = 190;
/// Shadowed shingle tone.
pub const SHADE: u8 = 110;
/// Tone of exposed decking or holes.
pub const HOLE: u8 = 20;
/// Rust-coloured flashing.
pub const RUST: [u8; 3] = [200, 40, 40];

/// Height of one shingle course in the banded builders.
const COURSE: u32 = 20;

/// Builder for synthetic roof photos.
pub struct SyntheticRoofBuilder;

impl SyntheticRoofBuilder {
    /// Healthy shingles: alternating light and shaded courses.
    ///
    /// On a 200x200 image this grades as good condition with low edge density
    /// (brightness 150, contrast 40, no dark pixels).
    #[must_use]
    pub fn healthy(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, y| course(y)))
    }

    /// Healthy shingles with the top `ratio` of rows missing (near black).
    ///
    /// Every row carries the same number of samples when `width` is a multiple
    /// of ten, so the darkness ratio of the result equals `ratio`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn missing_shingles(width: u32, height: u32, ratio: f64) -> DynamicImage {
        let dark_rows = (f64::from(height) * ratio).round() as u32;
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, y| {
            if y < dark_rows {
                Rgb([HOLE; 3])
            } else {
                course(y)
            }
        }))
    }

    /// Healthy shingles with the top `ratio` of rows rust coloured.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rusty_flashing(width: u32, height: u32, ratio: f64) -> DynamicImage {
        let rust_rows = (f64::from(height) * ratio).round() as u32;
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, y| {
            if y < rust_rows {
                Rgb(RUST)
            } else {
                course(y)
            }
        }))
    }

    /// Fine vertical stripes, one pixel wide. Every sampled column is an edge.
    #[must_use]
    pub fn cracked(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
            if x % 2 == 0 {
                Rgb([LIGHT; 3])
            } else {
                Rgb([SHADE; 3])
            }
        }))
    }

    /// A single flat colour.
    #[must_use]
    pub fn uniform(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value; 3])))
    }

    /// Encodes an image as PNG.
    ///
    /// # Panics
    ///
    /// Panics if PNG encoding fails, which does not happen for RGB8 images.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("PNG encoding of an RGB image");
        bytes
    }

    /// Wraps an image as an in-memory photo input.
    #[must_use]
    pub fn photo(label: &str, category: PhotoCategory, image: &DynamicImage) -> PhotoInput {
        PhotoInput::from_bytes(label, category, Self::png_bytes(image))
    }

    /// A photo whose bytes are not an image.
    #[must_use]
    pub fn corrupt(label: &str, category: PhotoCategory) -> PhotoInput {
        PhotoInput::from_bytes(label, category, b"definitely not a jpeg".to_vec())
    }
}

fn course(y: u32) -> Rgb<u8> {
    if (y / COURSE) % 2 == 0 {
        Rgb([LIGHT; 3])
    } else {
        Rgb([SHADE; 3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_shingles_rows() {
        let image = SyntheticRoofBuilder::missing_shingles(10, 100, 0.3).to_rgb8();
        assert_eq!(image.get_pixel(0, 29).0, [HOLE; 3]);
        assert_eq!(image.get_pixel(0, 30).0, [SHADE; 3]);
    }

    #[test]
    fn test_png_round_trip_keeps_pixels() {
        let image = SyntheticRoofBuilder::rusty_flashing(20, 20, 0.5);
        let photo = SyntheticRoofBuilder::photo("rust.png", PhotoCategory::Flashing, &image);
        let decoded = photo.decode().map(|d| d.to_rgb8());
        assert_eq!(decoded.ok().map(|d| d.get_pixel(0, 0).0), Some(RUST));
    }

    #[test]
    fn test_corrupt_photo_does_not_decode() {
        let photo = SyntheticRoofBuilder::corrupt("bad.jpg", PhotoCategory::General);
        assert!(photo.decode().is_err());
    }
}
