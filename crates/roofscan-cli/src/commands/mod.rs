//! CLI command definitions and handlers.

pub mod analyze;
pub mod models;
pub mod pricing;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use roofscan_adapters::{
    default_cache_path, CachedPricingSource, FilePricingSource, HttpPricingSource,
    StaticPricingSource,
};
use roofscan_core::PricingSource;
use tracing::debug;

use crate::config::AppConfig;

/// roofscan - Damage analysis for roof inspection photos
#[derive(Parser)]
#[command(name = "roofscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared analyze arguments (paths, thresholds, flags).
    #[command(flatten)]
    pub analyze: analyze::AnalyzeArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze roof photos for damage and estimate repair costs
    Analyze(analyze::AnalyzeArgs),
    /// Inspect the cost table and pricing cache
    Pricing(pricing::PricingArgs),
    /// Manage detector weights
    Models(models::ModelsArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// No damage found.
    Success,
    /// Damage found, or the photos need manual review.
    DamageFound,
    /// The command failed.
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::DamageFound => Self::from(1),
            ExitCode::Error => Self::from(2),
        }
    }
}

/// Where market pricing data comes from, after CLI and config layering.
#[derive(Debug, Clone, Default)]
pub struct PricingChoice {
    /// Live endpoint, cached on disk.
    pub url: Option<String>,
    /// Local pricing document.
    pub file: Option<PathBuf>,
    /// Derive the table from the built-in industry averages.
    pub builtin: bool,
    /// Hours a fetched document stays fresh.
    pub cache_hours: Option<u64>,
}

impl PricingChoice {
    /// Reads the `[pricing]` section.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            url: config.pricing.url.clone(),
            file: config.pricing.file.clone(),
            builtin: false,
            cache_hours: config.pricing.cache_hours,
        }
    }

    /// Builds the configured source. `None` keeps the built-in table.
    ///
    /// A URL wins over a file; both win over the built-in document.
    pub fn source(&self) -> Option<Box<dyn PricingSource>> {
        if let Some(url) = &self.url {
            let mut cached = CachedPricingSource::new(HttpPricingSource::new(url), cache_path());
            if let Some(hours) = self.cache_hours {
                cached = cached.with_ttl(Duration::from_secs(hours.saturating_mul(3600)));
            }
            debug!("Pricing source: {}", cached.describe());
            return Some(Box::new(cached));
        }
        if let Some(file) = &self.file {
            return Some(Box::new(FilePricingSource::new(file)));
        }
        if self.builtin {
            return Some(Box::new(StaticPricingSource));
        }
        None
    }
}

/// Pricing cache location, overridable through `ROOFSCAN_PRICING_CACHE`.
pub fn cache_path() -> PathBuf {
    std::env::var_os("ROOFSCAN_PRICING_CACHE").map_or_else(default_cache_path, PathBuf::from)
}
