//! Cost sampling port.

use crate::domain::CostRange;

/// Picks a concrete cost inside a range.
///
/// Estimates are intentionally varied between runs; tests inject a fixed
/// sampler to make costs deterministic.
pub trait CostSampler: Send {
    /// Returns a cost within `[range.min, range.max]`.
    fn sample(&mut self, range: &CostRange) -> u32;
}
