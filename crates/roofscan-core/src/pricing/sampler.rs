//! Random cost sampling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::CostRange;
use crate::ports::CostSampler;

/// Draws costs uniformly from `[min, max)`, floored to whole dollars.
#[derive(Debug, Clone)]
pub struct RandomCostSampler {
    rng: StdRng,
}

impl RandomCostSampler {
    /// Creates a sampler seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a reproducible sampler.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomCostSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl CostSampler for RandomCostSampler {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn sample(&mut self, range: &CostRange) -> u32 {
        if range.max <= range.min {
            return range.min;
        }
        let span = f64::from(range.max - range.min);
        let u: f64 = self.rng.random();
        // Safe: u in [0, 1) so the offset is below span
        range.min + (u * span).floor() as u32
    }
}
