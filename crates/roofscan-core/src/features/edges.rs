//! Local-contrast edge heuristic.

use image::RgbImage;

use super::stats::luminance;

/// Counts edge pixels on a strided grid.
///
/// Rows `1..h-1` are visited fully and columns `1..w-1` every `column_stride`
/// pixels. A pixel is an edge when its luminance differs from its right or
/// lower neighbour by more than `delta`.
#[must_use]
pub fn count_edges(image: &RgbImage, column_stride: usize, delta: f64) -> u64 {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return 0;
    }

    let lum = |x: u32, y: u32| luminance(image.get_pixel(x, y).0);
    let mut count = 0u64;

    for y in 1..height - 1 {
        for x in (1..width - 1).step_by(column_stride.max(1)) {
            let current = lum(x, y);
            let right = lum(x + 1, y);
            let down = lum(x, y + 1);
            if (current - right).abs() > delta || (current - down).abs() > delta {
                count += 1;
            }
        }
    }

    count
}

/// Normalizes an edge count to edges per thousand pixels of image area.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn edge_density(edges: u64, width: u32, height: u32) -> f64 {
    let area = f64::from(width) * f64::from(height);
    if area == 0.0 {
        return 0.0;
    }
    edges as f64 / (area / 1000.0)
}
