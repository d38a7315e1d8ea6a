//! roofscan core: damage analysis for roof inspection photos.
//!
//! Photos are decoded, summarized into visual features, run through an
//! object detector, and routed to a per-category classifier that emits
//! findings. Findings are priced from a cost table that can be refreshed
//! from market data once per session.

pub mod classifiers;
pub mod domain;
pub mod error;
pub mod features;
pub mod inference;
pub mod ports;
pub mod pricing;
pub mod session;

pub use classifiers::{ClassifierPolicy, ClassifierSet, DamageClassifier};
pub use domain::{
    Condition, CostRange, DamageAnalysis, DamageFinding, DamageKind, Detection, FeatureSummary,
    PhotoCategory, PhotoInput, Severity, SkippedPhoto,
};
pub use error::AnalysisError;
pub use features::{FeatureConfig, FeatureExtractor};
pub use inference::{DetectorConfig, LazyDetector};
pub use ports::{CostSampler, ObjectDetector, PricingSource, ProgressEvent, ProgressSink};
pub use pricing::{MarketCosts, PricingTable, RandomCostSampler};
pub use session::AnalysisSession;
