//! Pricing data source port.

use crate::pricing::MarketCosts;

/// A source of per-area roofing cost data.
///
/// Implementations are untrusted: the returned document is validated before use.
pub trait PricingSource: Send + Sync {
    /// Describes the source for logs (e.g. a URL or file path).
    fn describe(&self) -> String;

    /// Fetches the current market cost document.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be fetched or parsed.
    fn fetch(&self) -> anyhow::Result<MarketCosts>;
}
