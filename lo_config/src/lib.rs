//! ABOUTME: Configuration management with validation and environment loading
//! ABOUTME: Handles detector, capture, storage and loop settings from files and environment

use config::{Config as ConfigBuilder, Environment, File};
use lo_capture::CaptureConfig;
use lo_core::{Error, Result};
use lo_storage::StorageConfig;
use lo_vision::MotionConfig;
use lo_watch::WatchConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use validator::Validate;

/// Prefix of environment variables, e.g. `LOOKOUT_DETECTOR__AREA_THRESHOLD=500`
pub const ENV_PREFIX: &str = "LOOKOUT";

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_FILE_STEM: &str = "lookout";

/// Main configuration struct
#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub detector: MotionConfig,
    #[validate(nested)]
    pub capture: CaptureConfig,
    #[validate(nested)]
    pub storage: StorageConfig,
    #[validate(nested)]
    pub watch: WatchConfig,
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `production` switches to JSON log lines
    #[validate(length(min = 1))]
    pub env: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            env: "development".to_string(),
        }
    }
}

impl Config {
    /// Load defaults, then the config file (if any), then `LOOKOUT_` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = ConfigBuilder::try_from(&Config::default())?;
        let mut builder = ConfigBuilder::builder().add_source(defaults);

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_FILE_STEM).required(false)),
        };

        // Environment variables have the highest priority
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(" ")
                .with_list_parse_key("capture.command"),
        );

        let config = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build config: {}", e)))?;

        let parsed: Config = config
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to deserialize config: {}", e)))?;

        parsed.check()?;
        debug!(?parsed, "Configuration loaded");
        Ok(parsed)
    }

    /// Validate every section
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::Config(format!("Config validation failed: {}", e)))
    }

    /// Effective configuration as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}
