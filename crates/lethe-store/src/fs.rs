//! Filesystem partition backend.
//!
//! Layout: `{root}/{kind}/{id}.media`. Each partition is a plain directory
//! created on first write; a missing directory reads as an empty partition.
//! Writes go through a uniquely named hidden temp file in the same directory,
//! are fsynced, then renamed over the destination.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lethe_core::defaults::RECORD_EXTENSION;
use lethe_core::{validate_media_id, MediaKind, Result};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::PartitionBackend;

/// Directory used by [`FilesystemBackend::validate`]. Not a partition name.
const HEALTH_CHECK_DIR: &str = ".health-check";

/// Filesystem storage backend.
#[derive(Debug, Clone)]
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_dir(&self, partition: MediaKind) -> PathBuf {
        self.root.join(partition.as_str())
    }

    fn record_path(&self, partition: MediaKind, key: &str) -> Result<PathBuf> {
        validate_media_id(key)?;
        Ok(self
            .partition_dir(partition)
            .join(format!("{}.{}", key, RECORD_EXTENSION)))
    }

    /// Validate that the backend can write, read, and delete files.
    ///
    /// Performs a full round-trip at startup to surface permission errors
    /// and missing mounts before any record is written.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.root.join(HEALTH_CHECK_DIR);
        let test_file = test_dir.join("probe.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"lethe-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }
}

#[async_trait]
impl PartitionBackend for FilesystemBackend {
    async fn get(&self, partition: MediaKind, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.record_path(partition, key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, partition: MediaKind, key: &str, data: &[u8]) -> Result<()> {
        let full_path = self.record_path(partition, key)?;
        let dir = self.partition_dir(partition);
        debug!(partition = %partition, key, size = data.len(), "fs_backend: put");

        fs::create_dir_all(&dir).await.map_err(|e| {
            warn!(dir = %dir.display(), error = %e, "fs_backend: create_dir_all failed");
            e
        })?;

        // Temp name is independent of the key so any valid id fits the name limit.
        let temp_path = dir.join(format!(".{}.tmp", Uuid::new_v4().simple()));
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "fs_backend: File::create failed");
            e
        })?;
        if let Err(e) = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await
        {
            warn!(error = %e, "fs_backend: write failed");
            drop(file);
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "fs_backend: rename failed");
            e
        })?;

        Ok(())
    }

    async fn remove(&self, partition: MediaKind, key: &str) -> Result<bool> {
        let path = self.record_path(partition, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self, partition: MediaKind) -> Result<BTreeSet<String>> {
        let dir = self.partition_dir(partition);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = BTreeSet::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with('.') || validate_media_id(stem).is_err() {
                continue;
            }
            keys.insert(stem.to_string());
        }
        Ok(keys)
    }

    async fn contains(&self, partition: MediaKind, key: &str) -> Result<bool> {
        let path = self.record_path(partition, key)?;
        Ok(fs::try_exists(path).await?)
    }
}
