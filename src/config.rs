//! Configuration management for the anomaly pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Synthetic data generation parameters
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Rows generated per batch
    #[serde(default = "default_rows")]
    pub rows: usize,
    /// Lower bound of the uniform amount range
    #[serde(default = "default_amount_min")]
    pub amount_min: f64,
    /// Upper bound of the uniform amount range
    #[serde(default = "default_amount_max")]
    pub amount_max: f64,
    /// Purposes to draw from; empty means the built-in set
    #[serde(default)]
    pub purposes: Vec<String>,
    /// Alpha-3 country codes to draw from; empty means the built-in set
    #[serde(default)]
    pub countries: Vec<String>,
    /// Generator RNG seed
    #[serde(default = "default_generator_seed")]
    pub seed: u64,
}

fn default_rows() -> usize {
    50
}

fn default_amount_min() -> f64 {
    5_000.0
}

fn default_amount_max() -> f64 {
    80_000.0
}

fn default_generator_seed() -> u64 {
    7
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            amount_min: default_amount_min(),
            amount_max: default_amount_max(),
            purposes: Vec::new(),
            countries: Vec::new(),
            seed: default_generator_seed(),
        }
    }
}

/// Outlier detector parameters
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Expected fraction of outliers, in (0, 0.5]
    #[serde(default = "default_contamination")]
    pub contamination: f64,
    /// Number of trees in the isolation forest
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Subsample size per tree
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    /// Seed for the forest RNG, stored so fits are reproducible
    #[serde(default = "default_detector_seed")]
    pub seed: u64,
    /// Forbid implicit fitting on the first score call
    #[serde(default)]
    pub strict: bool,
}

fn default_contamination() -> f64 {
    0.1
}

fn default_n_estimators() -> usize {
    100
}

fn default_max_samples() -> usize {
    256
}

fn default_detector_seed() -> u64 {
    42
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            contamination: default_contamination(),
            n_estimators: default_n_estimators(),
            max_samples: default_max_samples(),
            seed: default_detector_seed(),
            strict: false,
        }
    }
}

/// Batch loop configuration for the pipeline binary
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of batches to generate before exiting
    #[serde(default = "default_batches")]
    pub batches: usize,
    /// Delay between batches in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Force a model refresh every N batches; 0 keeps the first fit forever
    #[serde(default = "default_retrain_every")]
    pub retrain_every: usize,
}

fn default_batches() -> usize {
    10
}

fn default_interval_ms() -> u64 {
    500
}

fn default_retrain_every() -> usize {
    5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batches: default_batches(),
            interval_ms: default_interval_ms(),
            retrain_every: default_retrain_every(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load from the default path, falling back to built-in defaults when
    /// the file does not exist. A present-but-malformed file is still an
    /// error.
    pub fn load_or_default() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load()
        } else {
            Ok(Self::default())
        }
    }
}
