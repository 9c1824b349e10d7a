//! ABOUTME: Replays still images from a directory as a frame source
//! ABOUTME: Used to tune detection thresholds against recorded footage

use crate::{FrameFetch, FrameSource};
use async_trait::async_trait;
use lo_core::{Error, Result};
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// File extensions picked up from the directory
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Frame source over the image files of one directory, in lexical order
#[derive(Debug)]
pub struct DirectorySource {
    dir: PathBuf,
    pending: VecDeque<PathBuf>,
    total: usize,
}

impl DirectorySource {
    /// List the directory once; files added later are not picked up
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub async fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| {
            Error::Config(format!("Cannot read source directory {}: {}", dir.display(), e))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && has_image_extension(&path) {
                files.push(path);
            }
        }
        files.sort();

        info!(files = files.len(), "Directory source opened");
        Ok(Self {
            dir,
            total: files.len(),
            pending: files.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

#[async_trait]
impl FrameSource for DirectorySource {
    async fn next_frame(&mut self) -> Result<FrameFetch> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(FrameFetch::EndOfStream);
        };

        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read frame file");
                return Ok(FrameFetch::unavailable(format!("read failed: {}", e)));
            }
        };

        match image::load_from_memory(&data) {
            Ok(img) => {
                debug!(path = %path.display(), "Frame loaded");
                Ok(FrameFetch::Frame(img.to_rgb8()))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to decode frame file");
                Ok(FrameFetch::unavailable(format!("decode failed: {}", e)))
            }
        }
    }

    fn describe(&self) -> String {
        format!("directory:{} ({} files)", self.dir.display(), self.total)
    }
}
