//! ABOUTME: Capacity guard that stops capture once the save directory is full
//! ABOUTME: Counts once, tracks writes incrementally, and re-lists periodically

use crate::{ArtifactStore, StorageError};
use tracing::{debug, info, warn};

/// Outcome of a capacity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityStatus {
    Available { entries: usize, ceiling: usize },
    Reached { entries: usize, ceiling: usize },
}

impl CapacityStatus {
    pub fn is_reached(&self) -> bool {
        matches!(self, CapacityStatus::Reached { .. })
    }
}

/// Enforces the file-count ceiling on the artifact store
#[derive(Debug)]
pub struct CapacityGuard {
    ceiling: usize,
    entries: usize,
    rescan_interval: u64,
    since_scan: u64,
}

impl CapacityGuard {
    /// Count the store's current entries and start tracking from there
    pub async fn open<S: ArtifactStore>(
        store: &S,
        ceiling: usize,
        rescan_interval: u64,
    ) -> Result<Self, StorageError> {
        let entries = store.count().await?;
        info!(
            location = %store.location(),
            entries,
            ceiling,
            "Capacity guard initialized"
        );
        Ok(Self {
            ceiling,
            entries,
            rescan_interval: rescan_interval.max(1),
            since_scan: 0,
        })
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// True when the store already holds `ceiling` entries, so no further write may happen
    pub fn is_full(&self) -> bool {
        self.entries >= self.ceiling
    }

    /// Account for one artifact written by this process
    pub fn record_write(&mut self) {
        self.entries += 1;
    }

    /// End-of-iteration check: reached once the count exceeds the ceiling
    pub async fn check<S: ArtifactStore>(
        &mut self,
        store: &S,
    ) -> Result<CapacityStatus, StorageError> {
        self.since_scan += 1;
        if self.since_scan >= self.rescan_interval {
            self.rescan(store).await?;
        }

        if self.entries > self.ceiling {
            warn!(entries = self.entries, ceiling = self.ceiling, "File limit reached");
            Ok(CapacityStatus::Reached {
                entries: self.entries,
                ceiling: self.ceiling,
            })
        } else {
            Ok(CapacityStatus::Available {
                entries: self.entries,
                ceiling: self.ceiling,
            })
        }
    }

    /// Re-list the store to pick up external additions or deletions
    pub async fn rescan<S: ArtifactStore>(&mut self, store: &S) -> Result<(), StorageError> {
        let counted = store.count().await?;
        if counted != self.entries {
            debug!(
                tracked = self.entries,
                counted,
                "Capacity count resynchronized"
            );
        }
        self.entries = counted;
        self.since_scan = 0;
        Ok(())
    }
}
