/// Core error type for lookout
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    /// No frame could be obtained to seed the background model
    #[error("No frame available to initialize the background model after {attempts} attempts")]
    StartupFrameUnavailable { attempts: u32 },

    /// The frame source kept failing past the configured limit
    #[error("Frame source stalled: {consecutive_failures} consecutive failures")]
    SourceStalled { consecutive_failures: u32 },
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
