//! Pricing data sources: HTTP, local file, on-disk cache and built-in averages.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use roofscan_core::ports::PricingSource;
use roofscan_core::pricing::MarketCosts;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Default HTTP timeout for pricing requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a cached pricing document stays fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Fetches a pricing document over HTTP.
///
/// Accepts a bare document or one wrapped in `{ "success": .., "data": .. }`.
#[derive(Debug, Clone)]
pub struct HttpPricingSource {
    url: String,
    timeout: Duration,
}

impl HttpPricingSource {
    /// Creates a source for `url` with the default timeout.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl PricingSource for HttpPricingSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<MarketCosts> {
        debug!("Requesting pricing data from {}", self.url);
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let response = client
            .get(&self.url)
            .send()
            .with_context(|| format!("Failed to reach {}", self.url))?;
        if !response.status().is_success() {
            anyhow::bail!("Pricing request failed with status: {}", response.status());
        }

        let body = response
            .text()
            .with_context(|| format!("Failed to read response from {}", self.url))?;
        Ok(MarketCosts::from_json(&body)?)
    }
}

/// Reads a pricing document from a JSON file.
#[derive(Debug, Clone)]
pub struct FilePricingSource {
    path: PathBuf,
}

impl FilePricingSource {
    /// Creates a source reading `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PricingSource for FilePricingSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<MarketCosts> {
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read pricing file: {}", self.path.display()))?;
        Ok(MarketCosts::from_json(&json)?)
    }
}

/// The built-in industry averages, stamped with the current time.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPricingSource;

impl PricingSource for StaticPricingSource {
    fn describe(&self) -> String {
        "built-in industry averages".to_string()
    }

    fn fetch(&self) -> Result<MarketCosts> {
        Ok(MarketCosts::industry_average(OffsetDateTime::now_utc()))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    /// `describe()` of the source that produced `costs`.
    #[serde(default)]
    source: String,
    #[serde(with = "time::serde::rfc3339")]
    fetched_at: OffsetDateTime,
    costs: MarketCosts,
}

/// Serves a document from disk while it is fresh, otherwise asks `inner`.
///
/// A successful fetch from `inner` rewrites the cache file. A failed fetch is
/// returned as an error; stale entries and entries written by a different
/// source are never served.
pub struct CachedPricingSource<S> {
    inner: S,
    cache_path: PathBuf,
    ttl: Duration,
}

impl<S: PricingSource> CachedPricingSource<S> {
    /// Wraps `inner` with a cache file at `cache_path`.
    #[must_use]
    pub const fn new(inner: S, cache_path: PathBuf) -> Self {
        Self {
            inner,
            cache_path,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Sets how long cached documents stay fresh.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the cache file path.
    #[must_use]
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    fn read_fresh(&self, now: OffsetDateTime) -> Option<MarketCosts> {
        let json = std::fs::read_to_string(&self.cache_path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&json) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring unreadable pricing cache {}: {e}", self.cache_path.display());
                return None;
            }
        };

        let source = self.inner.describe();
        if entry.source != source {
            debug!(
                "Pricing cache was written by '{}', not '{source}'",
                entry.source
            );
            return None;
        }

        let age = now - entry.fetched_at;
        if age.is_negative() || age >= self.ttl {
            debug!("Pricing cache is stale ({age})");
            return None;
        }
        Some(entry.costs)
    }

    fn write(&self, costs: &MarketCosts, now: OffsetDateTime) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let entry = CacheEntry {
            source: self.inner.describe(),
            fetched_at: now,
            costs: costs.clone(),
        };
        let json = serde_json::to_string_pretty(&entry).context("Failed to encode pricing cache")?;
        std::fs::write(&self.cache_path, json)
            .with_context(|| format!("Failed to write {}", self.cache_path.display()))
    }
}

impl<S: PricingSource> PricingSource for CachedPricingSource<S> {
    fn describe(&self) -> String {
        format!("{} (cached)", self.inner.describe())
    }

    fn fetch(&self) -> Result<MarketCosts> {
        let now = OffsetDateTime::now_utc();
        if let Some(costs) = self.read_fresh(now) {
            debug!("Using cached pricing data from {}", self.cache_path.display());
            return Ok(costs);
        }

        let costs = self.inner.fetch()?;
        match self.write(&costs, now) {
            Ok(()) => info!("Cached pricing data at {}", self.cache_path.display()),
            Err(e) => warn!("Failed to cache pricing data: {e:#}"),
        }
        Ok(costs)
    }
}

/// Default location of the pricing cache file.
#[must_use]
pub fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roofscan")
        .join("pricing.json")
}
