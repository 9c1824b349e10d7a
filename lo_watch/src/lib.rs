//! ABOUTME: Motion watching loop: acquire, detect, persist, enforce the file ceiling
//! ABOUTME: Exposes the Watcher, its settings and the run summary

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

pub mod runner;

pub use runner::{RunSummary, StopReason, Watcher};

/// Loop-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WatchConfig {
    /// Stop after this many analysed frames (0 = run until stopped)
    pub max_frames: u64,
    /// Wait before the first acquisition, e.g. for removable storage to mount
    #[validate(range(max = 3600))]
    pub startup_delay_secs: u64,
}

impl WatchConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    pub fn frame_limit(&self) -> Option<u64> {
        match self.max_frames {
            0 => None,
            n => Some(n),
        }
    }
}
