//! Raw byte storage, one partition per media kind.

use std::collections::BTreeSet;

use async_trait::async_trait;
use lethe_core::{MediaKind, Result};

/// Storage backend trait for different storage implementations.
///
/// Backends deal only in opaque bytes keyed by `(partition, key)`. They never
/// see plaintext records.
#[async_trait]
pub trait PartitionBackend: Send + Sync {
    /// Read the bytes stored under `key`, or `None` if absent.
    async fn get(&self, partition: MediaKind, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write `data` under `key`, replacing any previous value.
    ///
    /// A reader must observe either the old value or the new one, never a
    /// partial write.
    async fn put(&self, partition: MediaKind, key: &str, data: &[u8]) -> Result<()>;

    /// Delete `key`. Returns `false` if nothing was stored.
    async fn remove(&self, partition: MediaKind, key: &str) -> Result<bool>;

    /// Keys present in a partition. A partition never written to is empty.
    async fn list_keys(&self, partition: MediaKind) -> Result<BTreeSet<String>>;

    /// Check if `key` exists in a partition.
    async fn contains(&self, partition: MediaKind, key: &str) -> Result<bool>;
}
