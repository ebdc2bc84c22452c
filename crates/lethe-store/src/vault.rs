//! Host-sealed vault over any [`PartitionBackend`].
//!
//! Every record is serialized to JSON and wrapped in an outer token under the
//! host-derived key before it reaches the backend. Listing reads partition
//! keys only and never opens a token.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use lethe_core::{validate_media_id, Error, MediaKind, MediaRecord, Result, VaultStore};
use lethe_crypto::{token, DerivedKey, HostFactsProvider, HostKeyDeriver};
use tracing::{debug, warn};

use crate::backend::PartitionBackend;
use crate::config::StoreConfig;
use crate::fs::FilesystemBackend;
use crate::memory::MemoryBackend;

/// Vault persisted under a root directory.
pub type FsVault = SealedVault<FilesystemBackend>;

/// Vault held in process memory.
pub type MemoryVault = SealedVault<MemoryBackend>;

/// [`VaultStore`] implementation applying the outer encryption layer.
///
/// An id that fails [`validate_media_id`] can never have been saved, so
/// lookups treat it as absent on every backend.
///
/// The host key is derived once, when the vault is constructed. A vault
/// opened on a host whose facts differ from the writer's cannot load any
/// existing record.
pub struct SealedVault<B> {
    backend: B,
    key: DerivedKey,
}

impl<B: PartitionBackend> SealedVault<B> {
    /// Wrap a backend with an already-derived outer key.
    pub fn new(backend: B, key: DerivedKey) -> Self {
        Self { backend, key }
    }

    /// Wrap a backend, deriving the outer key from `deriver` now.
    pub fn with_deriver(backend: B, deriver: &HostKeyDeriver) -> Result<Self> {
        let key = deriver.derive_key()?;
        Ok(Self::new(backend, key))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn seal_record(&self, record: &MediaRecord) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(record)?;
        Ok(token::seal(self.key.as_bytes(), &json)?)
    }

    fn open_record(&self, id: &str, partition: MediaKind, sealed: &[u8]) -> Result<MediaRecord> {
        let json = token::open(self.key.as_bytes(), sealed).map_err(|e| {
            warn!(media_id = id, media_kind = %partition, error = %e, "Outer layer rejected");
            Error::OuterDecrypt {
                media_id: id.to_string(),
                reason: e.to_string(),
            }
        })?;

        let record: MediaRecord = serde_json::from_slice(&json)?;
        if record.id != id || record.media_kind != partition {
            return Err(Error::Integrity(format!(
                "record stored as {}/{} claims to be {}/{}",
                partition, id, record.media_kind, record.id
            )));
        }
        Ok(record)
    }

    /// Partition currently holding `id`, if any.
    async fn locate(&self, id: &str) -> Result<Option<MediaKind>> {
        for kind in MediaKind::ALL {
            if self.backend.contains(kind, id).await? {
                return Ok(Some(kind));
            }
        }
        Ok(None)
    }
}

impl SealedVault<FilesystemBackend> {
    /// Open a filesystem vault, deriving the host key from `provider`.
    ///
    /// Runs the backend health check before returning.
    pub async fn open(config: &StoreConfig, provider: Arc<dyn HostFactsProvider>) -> Result<Self> {
        let deriver = HostKeyDeriver::new(provider, config.host_key_iterations)?;
        let backend = FilesystemBackend::new(&config.root);
        backend.validate().await.map_err(|e| {
            Error::Config(format!(
                "vault root {} failed health check: {}",
                config.root.display(),
                e
            ))
        })?;
        debug!(root = %config.root.display(), iterations = config.host_key_iterations, "Opened filesystem vault");
        Self::with_deriver(backend, &deriver)
    }
}

impl SealedVault<MemoryBackend> {
    /// Empty in-memory vault keyed from `provider`.
    pub fn in_memory(provider: Arc<dyn HostFactsProvider>, iterations: u32) -> Result<Self> {
        let deriver = HostKeyDeriver::new(provider, iterations)?;
        Self::with_deriver(MemoryBackend::new(), &deriver)
    }
}

impl<B> std::fmt::Debug for SealedVault<B>
where
    B: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedVault")
            .field("backend", &self.backend)
            .field("key", &self.key)
            .finish()
    }
}

#[async_trait]
impl<B: PartitionBackend> VaultStore for SealedVault<B> {
    async fn save(&self, record: &MediaRecord) -> Result<()> {
        validate_media_id(&record.id)?;

        for kind in MediaKind::ALL {
            if kind != record.media_kind && self.backend.contains(kind, &record.id).await? {
                return Err(Error::KindConflict {
                    media_id: record.id.clone(),
                    existing: kind,
                    requested: record.media_kind,
                });
            }
        }

        let sealed = self.seal_record(record)?;
        self.backend
            .put(record.media_kind, &record.id, &sealed)
            .await?;
        debug!(media_id = %record.id, media_kind = %record.media_kind, size = sealed.len(), "Saved media record");
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<MediaRecord> {
        if validate_media_id(id).is_err() {
            return Err(Error::MediaNotFound(id.to_string()));
        }
        for kind in MediaKind::ALL {
            if let Some(sealed) = self.backend.get(kind, id).await? {
                return self.open_record(id, kind, &sealed);
            }
        }
        Err(Error::MediaNotFound(id.to_string()))
    }

    async fn load_kind(&self, id: &str, kind: MediaKind) -> Result<MediaRecord> {
        if validate_media_id(id).is_err() {
            return Err(Error::MediaNotFound(id.to_string()));
        }
        match self.backend.get(kind, id).await? {
            Some(sealed) => self.open_record(id, kind, &sealed),
            None => Err(Error::MediaNotFound(id.to_string())),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if validate_media_id(id).is_err() {
            return Ok(false);
        }
        let mut removed = false;
        for kind in MediaKind::ALL {
            removed |= self.backend.remove(kind, id).await?;
        }
        if removed {
            debug!(media_id = id, "Deleted media record");
        }
        Ok(removed)
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        if validate_media_id(id).is_err() {
            return Ok(false);
        }
        Ok(self.locate(id).await?.is_some())
    }

    async fn list_all(&self) -> Result<BTreeSet<String>> {
        let mut ids = BTreeSet::new();
        for kind in MediaKind::ALL {
            ids.extend(self.backend.list_keys(kind).await?);
        }
        Ok(ids)
    }

    async fn list_by_kind(&self, kind: MediaKind) -> Result<BTreeSet<String>> {
        self.backend.list_keys(kind).await
    }
}
