//! ABOUTME: Local artifact persistence for motion frames and debug images
//! ABOUTME: Naming, JPEG encoding, debug-level policy, and the directory capacity guard

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;
use validator::Validate;

pub mod artifact;
pub mod guard;
pub mod policy;
pub mod store;

pub use artifact::{artifact_file_name, encode_jpeg, ArtifactRole, ArtifactWriter};
pub use guard::{CapacityGuard, CapacityStatus};
pub use policy::{DebugLevel, PersistencePolicy};
pub use store::{ArtifactStore, LocalArtifactStore, StoredArtifact};

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Invalid artifact name: {0}")]
    InvalidName(String),
}

impl From<StorageError> for lo_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io { source, .. } => lo_core::Error::Io(source),
            other => lo_core::Error::Storage(other.to_string()),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory receiving `{timestamp}_{role}.jpeg` artifacts
    #[validate(length(min = 1))]
    pub save_dir: String,
    /// Stop once the directory holds more entries than this
    #[validate(range(min = 1))]
    pub file_limit: usize,
    /// Which auxiliary artifacts to write
    pub debug_level: DebugLevel,
    /// JPEG quality (1-100)
    #[validate(range(min = 1, max = 100))]
    pub jpeg_quality: u8,
    /// Iterations between full re-counts of the save directory
    #[validate(range(min = 1))]
    pub rescan_interval: u64,
    /// Create the save directory at startup if it is missing
    pub create_dir: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            save_dir: "./captures".to_string(),
            file_limit: 6000,
            debug_level: DebugLevel::Off,
            jpeg_quality: 90,
            rescan_interval: 100,
            create_dir: true,
        }
    }
}
