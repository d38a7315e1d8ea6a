//! Luminance statistics over sampled pixels.

/// Luminance of an RGB pixel as the unweighted channel mean.
#[inline]
#[must_use]
pub fn luminance(rgb: [u8; 3]) -> f64 {
    (f64::from(rgb[0]) + f64::from(rgb[1]) + f64::from(rgb[2])) / 3.0
}

/// Accumulates sampled luminance values.
#[derive(Debug, Clone, Default)]
pub struct LuminanceStats {
    values: Vec<f64>,
    sum: f64,
}

impl LuminanceStats {
    /// Creates an empty accumulator with room for `capacity` samples.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            sum: 0.0,
        }
    }

    /// Records one sample.
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.values.push(value);
    }

    /// Number of samples.
    #[must_use]
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Mean luminance, 0 when empty.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.sum / self.values.len() as f64
    }

    /// Population standard deviation, 0 when empty.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .values
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / self.values.len() as f64;
        variance.sqrt()
    }

    /// Fraction of samples strictly below `threshold`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fraction_below(&self, threshold: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let below = self.values.iter().filter(|&&v| v < threshold).count();
        below as f64 / self.values.len() as f64
    }
}
