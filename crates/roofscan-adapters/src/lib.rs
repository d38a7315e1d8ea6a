//! roofscan adapters: filesystem, pricing and model-store implementations of
//! the core ports.

pub mod detector;
pub mod fs;
pub mod models;
pub mod pricing;

pub use detector::blaze_detector;
pub use fs::{infer_category, FsPhotoSource};
pub use models::{ModelSource, ModelStore, DETECTOR_FILENAME};
pub use pricing::{
    default_cache_path, CachedPricingSource, FilePricingSource, HttpPricingSource,
    StaticPricingSource,
};
