//! Analyze command - run damage analysis over inspection photos.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use roofscan_adapters::{blaze_detector, FsPhotoSource, ModelStore};
use roofscan_core::{
    AnalysisSession, DamageAnalysis, DetectorConfig, LazyDetector, PhotoCategory,
    RandomCostSampler,
};
use tracing::{debug, info, warn};

use super::{ExitCode, PricingChoice};
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Output format for the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON document
    #[default]
    Json,
    /// JSON Lines (one finding per line, then a summary line)
    Jsonl,
}

/// Parse and validate a confidence value (0.0-1.0).
fn parse_confidence(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Parse a photo category name.
fn parse_category(s: &str) -> Result<PhotoCategory, String> {
    PhotoCategory::from_name(s).ok_or_else(|| {
        let names: Vec<&str> = PhotoCategory::ALL.iter().map(|c| c.as_str()).collect();
        format!("'{s}' is not a category (expected one of: {})", names.join(", "))
    })
}

/// Shared arguments for photo analysis.
#[derive(Args, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct AnalyzeArgs {
    /// Photo files or directories to analyze
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Treat every photo as this category instead of inferring it from its path
    #[arg(long, value_parser = parse_category)]
    pub category: Option<PhotoCategory>,

    /// Skip the object detector
    #[arg(long)]
    pub no_detector: bool,

    /// Fail over to manual review when the detector weights cannot be loaded
    #[arg(long, conflicts_with = "no_detector")]
    pub require_detector: bool,

    /// Ignore detections at or below this confidence (0.0-1.0)
    #[arg(long, value_parser = parse_confidence)]
    pub min_confidence: Option<f32>,

    /// Run the detector on a GPU when available
    #[arg(long)]
    pub gpu: bool,

    /// Refresh cost estimates from this pricing endpoint
    #[arg(long, value_name = "URL", conflicts_with = "pricing_file")]
    pub pricing_url: Option<String>,

    /// Refresh cost estimates from a local pricing document
    #[arg(long, value_name = "FILE")]
    pub pricing_file: Option<PathBuf>,

    /// Use the built-in cost table without refreshing it
    #[arg(long, conflicts_with_all = ["pricing_url", "pricing_file"])]
    pub offline: bool,

    /// Seed for cost sampling (reproducible estimates)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl AnalyzeArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    ///
    /// For boolean flags the CLI always wins when passed; config decides otherwise.
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }

        if !args.no_detector && !args.require_detector {
            match config.detector.enabled {
                Some(true) => args.require_detector = true,
                Some(false) => args.no_detector = true,
                None => {}
            }
        }
        args.min_confidence = args.min_confidence.or(config.detector.min_confidence);
        if !args.gpu {
            args.gpu = config.detector.gpu.unwrap_or(false);
        }

        // A pricing flag on the command line replaces the configured source entirely.
        if args.pricing_url.is_none() && args.pricing_file.is_none() {
            args.pricing_url.clone_from(&config.pricing.url);
            if args.pricing_url.is_none() {
                args.pricing_file.clone_from(&config.pricing.file);
            }
        }
        if !args.offline {
            args.offline = config.pricing.offline.unwrap_or(false);
        }

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }

        args.config = Some(config.clone());
        args
    }

    /// Get output format with fallback to a single JSON document.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    fn config(&self) -> AppConfig {
        self.config.clone().unwrap_or_default()
    }

    fn pricing(&self) -> PricingChoice {
        if self.offline {
            return PricingChoice::default();
        }
        PricingChoice {
            url: self.pricing_url.clone(),
            file: self.pricing_file.clone(),
            builtin: false,
            cache_hours: self.config.as_ref().and_then(|c| c.pricing.cache_hours),
        }
    }
}

/// Result of running the analyze command.
pub struct AnalyzeResult {
    /// The analysis that was written to stdout.
    pub analysis: DamageAnalysis,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the analyze command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &AnalyzeArgs) -> Result<AnalyzeResult> {
    info!("Running analyze command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    let photos = FsPhotoSource::new(args.paths.clone(), args.recursive)
        .with_category(args.category)
        .photos();
    if photos.is_empty() {
        warn!("No supported photos found");
    }

    let config = args.config();
    let mut session = AnalysisSession::new(build_detector(args, &config))
        .with_feature_config(config.feature_config())
        .with_policy(policy(args, &config));
    if let Some(source) = args.pricing().source() {
        session = session.with_pricing_source(source);
    }
    if let Some(seed) = args.seed {
        debug!("Seeding cost sampler with {seed}");
        session = session.with_sampler(Box::new(RandomCostSampler::seeded(seed)));
    }

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = ProgressBar::new(photos.len() as u64, args.quiet, show_progress);

    let analysis = session.analyze(&photos, &progress);

    let output = JsonOutput::stdout();
    match args.format() {
        OutputFormat::Json => output.write_analysis(&analysis, args.pretty)?,
        OutputFormat::Jsonl => output.write_lines(&analysis)?,
    }
    output.flush()?;

    let exit_code = if analysis.manual_review || analysis.has_damage() {
        ExitCode::DamageFound
    } else {
        ExitCode::Success
    };

    Ok(AnalyzeResult {
        analysis,
        exit_code,
    })
}

/// Build the detector from merged args (CLI + config).
fn build_detector(args: &AnalyzeArgs, config: &AppConfig) -> LazyDetector {
    if args.no_detector {
        debug!("Object detector disabled");
        return LazyDetector::disabled();
    }

    let store = args
        .models_dir
        .clone()
        .map_or_else(ModelStore::default, ModelStore::new);

    let mut detector_config = DetectorConfig::default();
    if let Some(labels) = &config.detector.labels {
        detector_config.labels.clone_from(labels);
    }
    if let Some(threshold) = config.detector.score_threshold {
        detector_config.score_threshold = threshold;
    }
    if let Some(threshold) = config.detector.nms_threshold {
        detector_config.nms_threshold = threshold;
    }
    if let Some(max) = config.detector.max_detections {
        detector_config.max_detections = max;
    }

    let weights = store.detector_path();
    if !weights.exists() && !args.require_detector {
        warn!(
            "No detector weights at {}; running without object detection \
             (run `roofscan models fetch` to install them)",
            weights.display()
        );
        return LazyDetector::disabled();
    }
    debug!("Detector weights: {}", weights.display());
    blaze_detector(weights, detector_config, args.gpu)
}

fn policy(args: &AnalyzeArgs, config: &AppConfig) -> roofscan_core::ClassifierPolicy {
    let mut policy = config.classifier_policy();
    if let Some(min) = args.min_confidence {
        policy.min_detection_confidence = min;
    }
    policy
}
