//! Configuration file support for roofscan.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/roofscan/config.toml` (lowest priority)
//! - Project-local: `.roofscan.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use roofscan_core::classifiers::ClassifierPolicy;
use roofscan_core::features::FeatureConfig;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Copies each listed field from `$other` into `$base` when it is set there.
macro_rules! overlay {
    ($base:expr, $other:expr; $($field:ident),+ $(,)?) => {
        $( if $other.$field.is_some() { $base.$field = $other.$field.take(); } )+
    };
}

/// Writes each listed field that is set in `$overrides` onto `$target`.
macro_rules! apply {
    ($target:expr, $overrides:expr; $($field:ident),+ $(,)?) => {
        $( if let Some(value) = $overrides.$field { $target.$field = value; } )+
    };
}

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Feature extraction thresholds.
    pub features: FeaturesConfig,
    /// Classifier thresholds.
    pub classifiers: ClassifiersConfig,
    /// Object detector settings.
    pub detector: DetectorSection,
    /// Pricing data settings.
    pub pricing: PricingConfig,
    /// Model settings.
    pub models: ModelsConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
}

/// Feature extraction overrides.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub max_dimension: Option<u32>,
    pub sample_stride: Option<usize>,
    pub dark_luminance: Option<f64>,
    pub red_min: Option<u8>,
    pub red_dominance: Option<f64>,
    pub red_area_fraction: Option<f64>,
    pub dark_spot_ratio: Option<f64>,
    pub poor_darkness: Option<f64>,
    pub poor_brightness: Option<f64>,
    pub fair_darkness: Option<f64>,
    pub fair_brightness: Option<f64>,
    pub fair_contrast: Option<f64>,
    pub edge_stride: Option<usize>,
    pub edge_delta: Option<f64>,
}

/// Classifier threshold overrides.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifiersConfig {
    pub shingle_dark_trigger: Option<f64>,
    pub shingle_moderate_darkness: Option<f64>,
    pub shingle_severe_darkness: Option<f64>,
    pub edge_minor: Option<f64>,
    pub edge_moderate: Option<f64>,
    pub severe_darkness: Option<f64>,
    pub severe_brightness: Option<f64>,
    pub flashing_brightness: Option<f64>,
    pub gutter_min_objects: Option<usize>,
    pub general_edge_note: Option<f64>,
    pub fair_condition_cost: Option<u32>,
}

/// Object detector configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorSection {
    /// Run the object detector.
    pub enabled: Option<bool>,
    /// Detections at or below this confidence are ignored by classifiers.
    pub min_confidence: Option<f32>,
    /// Minimum class probability for a box.
    pub score_threshold: Option<f32>,
    /// Same-class overlap suppression threshold.
    pub nms_threshold: Option<f32>,
    /// Maximum boxes per photo.
    pub max_detections: Option<usize>,
    /// Class labels in model output order.
    pub labels: Option<Vec<String>>,
    /// Use a GPU when the build supports one.
    pub gpu: Option<bool>,
}

/// Pricing data configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// URL of a live pricing document.
    pub url: Option<String>,
    /// Local pricing document (used when no URL is set).
    pub file: Option<PathBuf>,
    /// Hours a fetched document is reused.
    pub cache_hours: Option<u64>,
    /// Skip the pricing refresh entirely.
    pub offline: Option<bool>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
    /// Download URL for `models fetch`.
    pub url: Option<String>,
    /// Expected SHA-256 of the downloaded weights.
    pub sha256: Option<String>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), String> {
        let ratios = [
            ("features.red_area_fraction", self.features.red_area_fraction),
            ("features.dark_spot_ratio", self.features.dark_spot_ratio),
            ("features.poor_darkness", self.features.poor_darkness),
            ("features.fair_darkness", self.features.fair_darkness),
            ("classifiers.shingle_dark_trigger", self.classifiers.shingle_dark_trigger),
            (
                "classifiers.shingle_moderate_darkness",
                self.classifiers.shingle_moderate_darkness,
            ),
            (
                "classifiers.shingle_severe_darkness",
                self.classifiers.shingle_severe_darkness,
            ),
            ("classifiers.severe_darkness", self.classifiers.severe_darkness),
            ("detector.min_confidence", self.detector.min_confidence.map(f64::from)),
            ("detector.score_threshold", self.detector.score_threshold.map(f64::from)),
            ("detector.nms_threshold", self.detector.nms_threshold.map(f64::from)),
        ];
        for (name, value) in ratios {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(format!("{name} must be 0.0-1.0, got {v}"));
                }
            }
        }

        if self.features.max_dimension == Some(0) {
            return Err("features.max_dimension must be at least 1".to_string());
        }
        if self.features.sample_stride == Some(0) {
            return Err("features.sample_stride must be at least 1".to_string());
        }
        if self.detector.labels.as_ref().is_some_and(Vec::is_empty) {
            return Err("detector.labels must not be empty".to_string());
        }

        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                return Err(format!("output.format must be 'json' or 'jsonl', got '{f}'"));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    pub fn merge(&mut self, mut other: Self) {
        overlay!(self.general, other.general; recursive);
        overlay!(self.features, other.features;
            max_dimension, sample_stride, dark_luminance, red_min, red_dominance,
            red_area_fraction, dark_spot_ratio, poor_darkness, poor_brightness,
            fair_darkness, fair_brightness, fair_contrast, edge_stride, edge_delta);
        overlay!(self.classifiers, other.classifiers;
            shingle_dark_trigger, shingle_moderate_darkness, shingle_severe_darkness,
            edge_minor, edge_moderate, severe_darkness, severe_brightness,
            flashing_brightness, gutter_min_objects, general_edge_note, fair_condition_cost);
        overlay!(self.detector, other.detector;
            enabled, min_confidence, score_threshold, nms_threshold, max_detections, labels, gpu);
        overlay!(self.pricing, other.pricing; url, file, cache_hours, offline);
        overlay!(self.models, other.models; dir, url, sha256);
        overlay!(self.output, other.output; format, pretty, progress);
    }

    /// Feature thresholds with config overrides applied to the defaults.
    #[must_use]
    pub fn feature_config(&self) -> FeatureConfig {
        let mut config = FeatureConfig::default();
        apply!(config, self.features;
            max_dimension, sample_stride, dark_luminance, red_min, red_dominance,
            red_area_fraction, dark_spot_ratio, poor_darkness, poor_brightness,
            fair_darkness, fair_brightness, fair_contrast, edge_stride, edge_delta);
        config
    }

    /// Classifier thresholds with config overrides applied to the defaults.
    #[must_use]
    pub fn classifier_policy(&self) -> ClassifierPolicy {
        let mut policy = ClassifierPolicy::default();
        apply!(policy, self.classifiers;
            shingle_dark_trigger, shingle_moderate_darkness, shingle_severe_darkness,
            edge_minor, edge_moderate, severe_darkness, severe_brightness,
            flashing_brightness, gutter_min_objects, general_edge_note, fair_condition_cost);
        if let Some(min) = self.detector.min_confidence {
            policy.min_detection_confidence = min;
        }
        policy
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("roofscan").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.roofscan.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(".roofscan.toml"))
        .find(|path| path.exists())
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {e}", path.display());
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to parse config file {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> AppConfig {
        toml::from_str(toml).expect("valid config")
    }

    #[test]
    fn test_empty_config() {
        let config = parse("");
        assert!(config.general.recursive.is_none());
        assert!(config.detector.enabled.is_none());
        assert_eq!(config.feature_config(), FeatureConfig::default());
        assert_eq!(config.classifier_policy(), ClassifierPolicy::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r"
[general]
recursive = true

[features]
max_dimension = 512
dark_luminance = 55.0

[classifiers]
shingle_severe_darkness = 0.3
gutter_min_objects = 5

[detector]
enabled = false
min_confidence = 0.5
labels = ['debris', 'vent']

[pricing]
url = 'https://pricing.example.test/costs'
cache_hours = 6

[models]
dir = '/opt/roofscan/models'

[output]
format = 'jsonl'
pretty = true
progress = false
",
        );

        assert_eq!(config.general.recursive, Some(true));
        assert_eq!(config.detector.enabled, Some(false));
        assert_eq!(
            config.detector.labels,
            Some(vec!["debris".to_string(), "vent".to_string()])
        );
        assert_eq!(config.pricing.cache_hours, Some(6));
        assert_eq!(config.models.dir, Some(PathBuf::from("/opt/roofscan/models")));
        assert_eq!(config.output.format.as_deref(), Some("jsonl"));

        let features = config.feature_config();
        assert_eq!(features.max_dimension, 512);
        assert_eq!(features.dark_luminance, 55.0);
        assert_eq!(features.sample_stride, FeatureConfig::default().sample_stride);

        let policy = config.classifier_policy();
        assert_eq!(policy.shingle_severe_darkness, 0.3);
        assert_eq!(policy.gutter_min_objects, 5);
        assert_eq!(policy.min_detection_confidence, 0.5);
    }

    #[test]
    fn test_merge_overrides_and_preserves() {
        let mut base = parse(
            r"
[features]
dark_luminance = 50.0
fair_contrast = 20.0

[pricing]
file = 'costs.json'
",
        );
        let project = parse(
            r"
[features]
dark_luminance = 65.0

[detector]
gpu = true
",
        );

        base.merge(project);

        assert_eq!(base.features.dark_luminance, Some(65.0));
        assert_eq!(base.features.fair_contrast, Some(20.0));
        assert_eq!(base.pricing.file, Some(PathBuf::from("costs.json")));
        assert_eq!(base.detector.gpu, Some(true));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base = parse("[output]\npretty = true\n");
        base.merge(AppConfig::default());
        assert_eq!(base.output.pretty, Some(true));
    }

    #[test]
    fn test_merge_empty_base_accepts_override() {
        let mut base = AppConfig::default();
        base.merge(parse("[classifiers]\nedge_minor = 12.0\n"));
        assert_eq!(base.classifiers.edge_minor, Some(12.0));
    }

    #[test]
    fn test_invalid_toml_syntax_handled() {
        let result: Result<AppConfig, _> = toml::from_str("[features\ndark_luminance = 5\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_field_type_handled() {
        let result: Result<AppConfig, _> = toml::from_str("[detector]\nenabled = 'yes'\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = parse("[detector]\nenabled = true\nflavour = 'spicy'\n\n[extra]\nx = 1\n");
        assert_eq!(config.detector.enabled, Some(true));
    }

    #[test]
    fn test_validate_ratio_out_of_range() {
        let mut config = AppConfig::default();
        config.classifiers.shingle_severe_darkness = Some(1.5);
        let err = config.validate().unwrap_err();
        assert!(err.contains("classifiers.shingle_severe_darkness"));

        let mut config = AppConfig::default();
        config.detector.min_confidence = Some(-0.1);
        assert!(config.validate().unwrap_err().contains("detector.min_confidence"));
    }

    #[test]
    fn test_validate_zero_stride() {
        let mut config = AppConfig::default();
        config.features.sample_stride = Some(0);
        assert!(config.validate().unwrap_err().contains("sample_stride"));
    }

    #[test]
    fn test_validate_empty_labels() {
        let mut config = AppConfig::default();
        config.detector.labels = Some(Vec::new());
        assert!(config.validate().unwrap_err().contains("detector.labels"));
    }

    #[test]
    fn test_validate_output_format_invalid() {
        let mut config = AppConfig::default();
        config.output.format = Some("xml".to_string());
        assert!(config.validate().unwrap_err().contains("output.format"));
    }

    #[test]
    fn test_validate_empty_config_passes() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_find_config_in_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(".roofscan.toml"), "").unwrap();

        assert_eq!(
            find_config_in_parents(&nested),
            Some(dir.path().join(".roofscan.toml"))
        );
    }
}
