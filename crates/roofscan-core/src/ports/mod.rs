//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the analysis core and its
//! collaborators: the object detector, the pricing data source, progress
//! reporting and the cost sampler.

mod cost_sampler;
mod detector;
mod pricing_source;
mod progress;

pub use cost_sampler::CostSampler;
pub use detector::{NullDetector, ObjectDetector};
pub use pricing_source::PricingSource;
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
