//! Core domain types for roof damage analysis.

mod cost;
mod detection;
mod features;
mod finding;
mod photo;

pub use cost::{group_thousands, CostRange, DamageKind, Severity};
pub use detection::{count_confident, BoundingBox, Detection};
pub use features::{Condition, FeatureSummary};
pub use finding::{
    no_damage_draft, CostBasis, DamageAnalysis, DamageFinding, FindingDraft, SkippedPhoto,
    MANUAL_REVIEW_CATEGORY, NO_DAMAGE_CATEGORY,
};
pub use photo::{PhotoCategory, PhotoData, PhotoInput};
