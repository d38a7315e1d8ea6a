//! Builds the candle detector from weights in the model store.

use std::path::PathBuf;

use anyhow::Context;
use roofscan_core::inference::{
    load_safetensors, select_device, BlazeDetector, DetectorConfig, LazyDetector,
};
use roofscan_core::ports::ObjectDetector;

/// Returns a lazy detector that loads `weights` on first use.
///
/// A missing weights file is reported as a load failure, which the session
/// turns into a manual-review result.
#[must_use]
pub fn blaze_detector(weights: PathBuf, config: DetectorConfig, prefer_gpu: bool) -> LazyDetector {
    LazyDetector::new(move || {
        if !weights.exists() {
            anyhow::bail!(
                "detector weights not found at {} (run `roofscan models fetch`)",
                weights.display()
            );
        }
        let device = select_device(prefer_gpu);
        let vb = load_safetensors(&weights, &device)?;
        let detector = BlazeDetector::new(vb, config.clone())
            .with_context(|| format!("Invalid detector weights: {}", weights.display()))?;
        Ok(Box::new(detector) as Box<dyn ObjectDetector>)
    })
}
