//! Pricing model: cost ranges per damage kind, market data, cost sampling.

mod market;
mod sampler;
mod table;

pub use market::{DollarRange, MarketCosts, PerSqFt, ReplacementTiers, RoofSizes};
pub use sampler::RandomCostSampler;
pub use table::{PricingTable, DEFAULT_SOURCE_LABEL};
