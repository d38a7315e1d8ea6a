//! Device selection for inference.

use candle_core::Device;
use tracing::info;

/// Picks the device the detector runs on.
///
/// With `prefer_gpu` set, tries Metal then CUDA (whichever the crate was built
/// with) before falling back to the CPU.
#[must_use]
pub fn select_device(prefer_gpu: bool) -> Device {
    if prefer_gpu {
        #[cfg(feature = "metal")]
        {
            if let Ok(device) = Device::new_metal(0) {
                info!("Running detector on Metal");
                return device;
            }
        }

        #[cfg(feature = "cuda")]
        {
            if let Ok(device) = Device::new_cuda(0) {
                info!("Running detector on CUDA");
                return device;
            }
        }
    }

    info!("Running detector on CPU");
    Device::Cpu
}
