//! Test support utilities for roofscan.
//!
//! Provides synthetic roof photos and mocks for the analysis ports.
//!
//! # Example
//!
//! ```
//! use roofscan_core::domain::PhotoCategory;
//! use roofscan_test_support::SyntheticRoofBuilder;
//!
//! let roof = SyntheticRoofBuilder::missing_shingles(200, 200, 0.35);
//! let photo = SyntheticRoofBuilder::photo("north-slope.png", PhotoCategory::Shingles, &roof);
//! assert!(photo.decode().is_ok());
//! ```

mod builders;
mod mocks;

pub use builders::{SyntheticRoofBuilder, HOLE, LIGHT, RUST, SHADE};
pub use mocks::{
    counting_lazy, failing_lazy, FixedCostSampler, LoadCounter, MockDetector, MockPricingSource,
    MockProgressSink, RangeEnd,
};
