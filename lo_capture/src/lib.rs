//! ABOUTME: Frame acquisition sources for the motion watcher
//! ABOUTME: Provides the FrameSource trait, directory/command/scripted sources and retry policy

use async_trait::async_trait;
use image::RgbImage;
use lo_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use validator::{Validate, ValidationError};

pub mod command_source;
pub mod directory_source;
pub mod retry;
pub mod scripted_source;

pub use command_source::CommandSource;
pub use directory_source::DirectorySource;
pub use retry::RetryPolicy;
pub use scripted_source::ScriptedSource;

/// Outcome of one acquisition attempt
#[derive(Debug, Clone)]
pub enum FrameFetch {
    /// A decoded 3-channel frame
    Frame(RgbImage),
    /// Nothing usable this time; the reason is for logs only
    Unavailable(String),
    /// The source has no more frames
    EndOfStream,
}

impl FrameFetch {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        FrameFetch::Unavailable(reason.into())
    }
}

/// Trait for frame sources (camera commands, recorded footage, test scripts)
#[async_trait]
pub trait FrameSource: Send {
    /// Acquire the next frame
    ///
    /// Transient problems are reported as `FrameFetch::Unavailable`; an `Err`
    /// means the source cannot continue at all.
    async fn next_frame(&mut self) -> Result<FrameFetch>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_capture_config"))]
pub struct CaptureConfig {
    /// Replay image files from this directory
    pub source_dir: Option<String>,
    /// Run this command per frame and decode its stdout (program followed by arguments)
    pub command: Vec<String>,
    /// Per-command timeout in milliseconds
    #[validate(range(min = 1))]
    pub command_timeout_ms: u64,
    /// Attempts to obtain the first frame before giving up
    #[validate(range(min = 1))]
    pub startup_attempts: u32,
    /// First backoff delay after an unavailable frame
    #[validate(range(min = 1))]
    pub retry_initial_ms: u64,
    /// Backoff delay ceiling
    #[validate(range(min = 1))]
    pub retry_max_ms: u64,
    /// Consecutive unavailable frames tolerated in the loop (0 = unlimited)
    pub max_consecutive_failures: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            command: Vec::new(),
            command_timeout_ms: 10_000,
            startup_attempts: 10,
            retry_initial_ms: 100,
            retry_max_ms: 5_000,
            max_consecutive_failures: 0,
        }
    }
}

fn validate_capture_config(config: &CaptureConfig) -> std::result::Result<(), ValidationError> {
    if config.source_dir.is_some() && !config.command.is_empty() {
        return Err(ValidationError::new("source_dir_and_command_are_exclusive"));
    }
    if config.retry_initial_ms > config.retry_max_ms {
        return Err(ValidationError::new("retry_initial_exceeds_retry_max"));
    }
    Ok(())
}

impl CaptureConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// Build the source selected by the configuration
pub async fn build_source(config: &CaptureConfig) -> Result<Box<dyn FrameSource>> {
    config
        .validate()
        .map_err(|e| Error::Config(format!("Invalid capture config: {}", e)))?;

    let source: Box<dyn FrameSource> = if !config.command.is_empty() {
        Box::new(CommandSource::new(
            config.command.clone(),
            config.command_timeout(),
        )?)
    } else if let Some(dir) = &config.source_dir {
        Box::new(DirectorySource::open(dir).await?)
    } else {
        return Err(Error::Config(
            "No frame source configured: set capture.command or capture.source_dir".to_string(),
        ));
    };

    info!(source = %source.describe(), "Frame source ready");
    Ok(source)
}
