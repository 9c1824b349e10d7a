//! ABOUTME: Artifact store abstraction and the local-directory implementation
//! ABOUTME: Write-once named files plus an entry count for the capacity guard

use crate::StorageError;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Result of storing an artifact
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    /// File name inside the store
    pub name: String,
    /// Full path of the written file
    pub path: PathBuf,
    /// Size of the stored artifact in bytes
    pub size: usize,
}

/// Destination for encoded artifacts
pub trait ArtifactStore {
    /// Write `data` under `name`; existing artifacts are never overwritten
    async fn write(&self, name: &str, data: Bytes) -> Result<StoredArtifact, StorageError>;

    /// Number of entries currently in the store
    async fn count(&self) -> Result<usize, StorageError>;

    /// Human-readable location for logs
    fn location(&self) -> String;
}

/// Stores artifacts as files in one directory
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Make sure the directory exists, creating it when allowed
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub async fn prepare(&self, create: bool) -> Result<(), StorageError> {
        if create {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| self.io_error(&self.dir, e))?;
        }

        let metadata = tokio::fs::metadata(&self.dir)
            .await
            .map_err(|e| self.io_error(&self.dir, e))?;
        if !metadata.is_dir() {
            return Err(StorageError::Io {
                path: self.dir.display().to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "save path is not a directory",
                ),
            });
        }

        info!("Artifact directory ready");
        Ok(())
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl ArtifactStore for LocalArtifactStore {
    async fn write(&self, name: &str, data: Bytes) -> Result<StoredArtifact, StorageError> {
        validate_name(name)?;
        let path = self.dir.join(name);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| self.io_error(&path, e))?;
        file.write_all(&data)
            .await
            .map_err(|e| self.io_error(&path, e))?;
        file.flush().await.map_err(|e| self.io_error(&path, e))?;

        Ok(StoredArtifact {
            name: name.to_string(),
            path,
            size: data.len(),
        })
    }

    async fn count(&self) -> Result<usize, StorageError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| self.io_error(&self.dir, e))?;

        let mut count = 0;
        while entries
            .next_entry()
            .await
            .map_err(|e| self.io_error(&self.dir, e))?
            .is_some()
        {
            count += 1;
        }
        Ok(count)
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::{fill_dir, scratch_dir};

    #[tokio::test]
    async fn test_write_and_count() {
        let dir = scratch_dir();
        let store = LocalArtifactStore::new(dir.path());
        assert_eq!(store.count().await.unwrap(), 0);

        let stored = store
            .write("a_color.jpeg", Bytes::from_static(b"jpeg"))
            .await
            .unwrap();
        assert_eq!(stored.size, 4);
        assert_eq!(stored.path, dir.path().join("a_color.jpeg"));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"jpeg");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_count_includes_foreign_entries() {
        let dir = scratch_dir();
        fill_dir(dir.path(), 7);
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let store = LocalArtifactStore::new(dir.path());
        assert_eq!(store.count().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_artifacts_are_write_once() {
        let dir = scratch_dir();
        let store = LocalArtifactStore::new(dir.path());
        store.write("x.jpeg", Bytes::from_static(b"1")).await.unwrap();
        let second = store.write("x.jpeg", Bytes::from_static(b"2")).await;
        assert!(matches!(second, Err(StorageError::Io { .. })));
        assert_eq!(std::fs::read(dir.path().join("x.jpeg")).unwrap(), b"1");
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = scratch_dir();
        let store = LocalArtifactStore::new(dir.path());
        for name in ["", "..", "../escape.jpeg", "a/b.jpeg"] {
            let result = store.write(name, Bytes::from_static(b"x")).await;
            assert!(matches!(result, Err(StorageError::InvalidName(_))), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_prepare_creates_directory() {
        let dir = scratch_dir();
        let target = dir.path().join("captures").join("cam1");
        let store = LocalArtifactStore::new(&target);

        assert!(store.prepare(false).await.is_err());
        store.prepare(true).await.unwrap();
        assert!(target.is_dir());
    }

    #[tokio::test]
    async fn test_prepare_rejects_file_path() {
        let dir = scratch_dir();
        let file = dir.path().join("not_a_dir");
        std::fs::write(&file, b"x").unwrap();
        let store = LocalArtifactStore::new(&file);
        assert!(store.prepare(false).await.is_err());
    }
}
