//! Candle inference for the object detector.

mod blaze_detector;
mod device;
mod lazy;
mod loader;
mod utils;

pub use blaze_detector::{BlazeDetector, DetectorConfig, INPUT_SIZE};
pub use device::select_device;
pub use lazy::{DetectorLoader, LazyDetector};
pub use loader::load_safetensors;
pub use utils::{iou, sigmoid};
