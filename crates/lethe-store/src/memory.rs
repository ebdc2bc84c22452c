//! In-process partition backend.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use lethe_core::{MediaKind, Result};
use tokio::sync::RwLock;

use crate::backend::PartitionBackend;

/// Volatile backend holding sealed bytes in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    partitions: RwLock<HashMap<MediaKind, HashMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PartitionBackend for MemoryBackend {
    async fn get(&self, partition: MediaKind, key: &str) -> Result<Option<Vec<u8>>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(&partition)
            .and_then(|p| p.get(key))
            .cloned())
    }

    async fn put(&self, partition: MediaKind, key: &str, data: &[u8]) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(partition)
            .or_default()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn remove(&self, partition: MediaKind, key: &str) -> Result<bool> {
        let mut partitions = self.partitions.write().await;
        Ok(partitions
            .get_mut(&partition)
            .map(|p| p.remove(key).is_some())
            .unwrap_or(false))
    }

    async fn list_keys(&self, partition: MediaKind) -> Result<BTreeSet<String>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(&partition)
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn contains(&self, partition: MediaKind, key: &str) -> Result<bool> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(&partition)
            .is_some_and(|p| p.contains_key(key)))
    }
}
