//! Lifecycle manager: decay evaluation, access bookkeeping, and expiry cleanup.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use lethe_core::decay::{self, DecayConfig};
use lethe_core::{
    new_v7_at, AdmissionDraw, Clock, DecayStatus, Error, MediaKind, MediaRecord, MediaStatus,
    Result, SystemClock, ThreadRngDraw, VaultStore,
};
use tracing::{debug, info, instrument, warn};

/// Applies the decay model to stored records.
///
/// All time comes from the injected [`Clock`] and all admission randomness
/// from the injected [`AdmissionDraw`].
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn VaultStore>,
    config: DecayConfig,
    clock: Arc<dyn Clock>,
    draw: Arc<dyn AdmissionDraw>,
}

impl LifecycleManager {
    /// Manager with default decay config, wall clock, and thread RNG.
    pub fn new(store: Arc<dyn VaultStore>) -> Self {
        Self::builder(store).build()
    }

    pub fn builder(store: Arc<dyn VaultStore>) -> LifecycleManagerBuilder {
        LifecycleManagerBuilder::new(store)
    }

    pub fn vault(&self) -> &Arc<dyn VaultStore> {
        &self.store
    }

    pub fn config(&self) -> &DecayConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // =========================================================================
    // Decay evaluation
    // =========================================================================

    /// Age, probability, and expiry of `record` right now.
    pub fn get_status(&self, record: &MediaRecord) -> DecayStatus {
        decay::status(record.time_created, self.clock.now(), &self.config)
    }

    pub fn probability(&self, record: &MediaRecord) -> f64 {
        self.get_status(record).probability
    }

    pub fn is_expired(&self, record: &MediaRecord) -> bool {
        self.get_status(record).expired
    }

    /// One probabilistic admission draw. Repeated calls draw again.
    pub fn should_admit(&self, record: &MediaRecord) -> bool {
        let age = decay::age_minutes(record.time_created, self.clock.now());
        decay::should_admit(age, &self.config, self.draw.as_ref())
    }

    // =========================================================================
    // Access bookkeeping
    // =========================================================================

    /// Stamp `time_last_loaded` and persist.
    ///
    /// The stamp is never earlier than `time_created`.
    pub async fn mark_loaded(&self, mut record: MediaRecord) -> Result<MediaRecord> {
        let now = self.clock.now();
        record.time_last_loaded = Some(now.max(record.time_created));
        self.store.save(&record).await?;
        debug!(media_id = %record.id, "Marked media loaded");
        Ok(record)
    }

    /// Stamp `time_last_parsed` and persist.
    ///
    /// The stamp is never earlier than `time_last_loaded` (or `time_created`
    /// if the record was never loaded).
    pub async fn mark_parsed(&self, mut record: MediaRecord) -> Result<MediaRecord> {
        let now = self.clock.now();
        let floor = record.time_last_loaded.unwrap_or(record.time_created);
        record.time_last_parsed = Some(now.max(floor));
        self.store.save(&record).await?;
        debug!(media_id = %record.id, "Marked media parsed");
        Ok(record)
    }

    // =========================================================================
    // Write path
    // =========================================================================

    /// Encrypt and store new media under a generated id.
    pub async fn store(
        &self,
        kind: MediaKind,
        owner_id: &str,
        plaintext: &[u8],
    ) -> Result<MediaRecord> {
        let id = new_v7_at(&self.clock.now()).to_string();
        self.store_with_id(&id, kind, owner_id, plaintext).await
    }

    /// Encrypt and store media under a caller-chosen id.
    ///
    /// Replaces an existing record of the same kind; fails with
    /// [`Error::KindConflict`] if the id is held by another kind.
    pub async fn store_with_id(
        &self,
        id: &str,
        kind: MediaKind,
        owner_id: &str,
        plaintext: &[u8],
    ) -> Result<MediaRecord> {
        let content = lethe_crypto::encrypt(plaintext)?;
        let record = MediaRecord::new(id, kind, owner_id, content, self.clock.now())?;
        self.store.save(&record).await?;
        debug!(media_id = %record.id, media_kind = %kind, size = plaintext.len(), "Stored media");
        Ok(record)
    }

    /// Status report for a stored record.
    pub async fn media_status(&self, id: &str) -> Result<MediaStatus> {
        let record = self.store.load(id).await?;
        Ok(MediaStatus {
            decay: self.get_status(&record),
            media_id: record.id,
            media_kind: record.media_kind,
            time_created: record.time_created,
            time_last_loaded: record.time_last_loaded,
            time_last_parsed: record.time_last_parsed,
        })
    }

    // =========================================================================
    // Cleanup
    // =========================================================================

    /// Delete every expired record. Returns the ids actually removed.
    ///
    /// Scans all partitions. A record that vanishes mid-scan, fails to open,
    /// is re-stored before deletion, or fails to delete is logged and skipped;
    /// the pass carries on.
    #[instrument(skip(self))]
    pub async fn cleanup_aged(&self) -> Result<BTreeSet<String>> {
        let start = Instant::now();
        let ids = self.store.list_all().await?;
        let mut deleted = BTreeSet::new();

        for id in ids {
            let record = match self.store.load(&id).await {
                Ok(record) => record,
                Err(Error::MediaNotFound(_)) => {
                    debug!(media_id = %id, "Media removed during cleanup scan");
                    continue;
                }
                Err(e) => {
                    warn!(media_id = %id, error = %e, "Skipping unreadable media during cleanup");
                    continue;
                }
            };

            if !self.is_expired(&record) {
                continue;
            }

            // A record re-stored under this id since the scan read it must survive.
            // The check narrows the race but cannot close it: a save landing between
            // this load and the delete is still lost, so writers to one id must not
            // overlap a cleanup pass.
            match self.store.load(&id).await {
                Ok(current)
                    if current.time_created == record.time_created
                        && current.content_key == record.content_key => {}
                Ok(_) => {
                    debug!(media_id = %id, "Media re-stored during cleanup, keeping it");
                    continue;
                }
                Err(Error::MediaNotFound(_)) => {
                    debug!(media_id = %id, "Expired media already gone");
                    continue;
                }
                Err(e) => {
                    warn!(media_id = %id, error = %e, "Skipping media that changed during cleanup");
                    continue;
                }
            }

            match self.store.delete(&id).await {
                Ok(true) => {
                    deleted.insert(id);
                }
                Ok(false) => {
                    debug!(media_id = %id, "Expired media already gone");
                }
                Err(e) => {
                    warn!(media_id = %id, error = %e, "Failed to delete expired media");
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        if deleted.is_empty() {
            debug!(duration_ms, "Cleanup pass found nothing to delete");
        } else {
            info!(deleted = deleted.len(), duration_ms, "Cleanup pass deleted expired media");
        }
        Ok(deleted)
    }
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`LifecycleManager`].
pub struct LifecycleManagerBuilder {
    store: Arc<dyn VaultStore>,
    config: DecayConfig,
    clock: Arc<dyn Clock>,
    draw: Arc<dyn AdmissionDraw>,
}

impl LifecycleManagerBuilder {
    pub fn new(store: Arc<dyn VaultStore>) -> Self {
        Self {
            store,
            config: DecayConfig::default(),
            clock: Arc::new(SystemClock),
            draw: Arc::new(ThreadRngDraw),
        }
    }

    pub fn with_config(mut self, config: DecayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_draw(mut self, draw: Arc<dyn AdmissionDraw>) -> Self {
        self.draw = draw;
        self
    }

    pub fn build(self) -> LifecycleManager {
        LifecycleManager {
            store: self.store,
            config: self.config,
            clock: self.clock,
            draw: self.draw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use lethe_core::{FixedClock, FixedDraw};
    use lethe_crypto::{HostFacts, StaticHostFacts};
    use lethe_store::MemoryVault;

    fn vault() -> Arc<dyn VaultStore> {
        let facts = StaticHostFacts(HostFacts {
            total_memory_bytes: 4 << 30,
            logical_cpus: 4,
            processor: "unit".into(),
            architecture: "x86_64".into(),
            os_name: "linux".into(),
        });
        Arc::new(MemoryVault::in_memory(Arc::new(facts), 12).unwrap())
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
    }

    /// Forwards to `inner`, but saves `replacement` right after the first load
    /// of its id, as if another writer re-stored it mid-pass.
    struct RestoreAfterLoad {
        inner: Arc<dyn VaultStore>,
        replacement: std::sync::Mutex<Option<MediaRecord>>,
    }

    #[async_trait::async_trait]
    impl VaultStore for RestoreAfterLoad {
        async fn save(&self, record: &MediaRecord) -> Result<()> {
            self.inner.save(record).await
        }

        async fn load(&self, id: &str) -> Result<MediaRecord> {
            let loaded = self.inner.load(id).await;
            let pending = {
                let mut slot = self.replacement.lock().unwrap();
                match slot.as_ref() {
                    Some(r) if r.id == id => slot.take(),
                    _ => None,
                }
            };
            if let Some(r) = pending {
                self.inner.save(&r).await?;
            }
            loaded
        }

        async fn load_kind(&self, id: &str, kind: MediaKind) -> Result<MediaRecord> {
            self.inner.load_kind(id, kind).await
        }

        async fn delete(&self, id: &str) -> Result<bool> {
            self.inner.delete(id).await
        }

        async fn exists(&self, id: &str) -> Result<bool> {
            self.inner.exists(id).await
        }

        async fn list_all(&self) -> Result<BTreeSet<String>> {
            self.inner.list_all().await
        }

        async fn list_by_kind(&self, kind: MediaKind) -> Result<BTreeSet<String>> {
            self.inner.list_by_kind(kind).await
        }
    }

    fn manager(clock: Arc<FixedClock>, draw: FixedDraw) -> LifecycleManager {
        LifecycleManager::builder(vault())
            .with_clock(clock)
            .with_draw(Arc::new(draw))
            .build()
    }

    #[tokio::test]
    async fn test_store_then_status_fresh() {
        let clock = Arc::new(FixedClock::new(start()));
        let mgr = manager(clock.clone(), FixedDraw::always_deny());

        let record = mgr.store(MediaKind::Photo, "u1", b"pixels").await.unwrap();
        assert_eq!(record.time_created, start());

        let status = mgr.get_status(&record);
        assert_eq!(status.age_minutes, 0.0);
        assert_eq!(status.probability, 1.0);
        assert!(!status.expired);
        // Full probability admits even the highest draw.
        assert!(mgr.should_admit(&record));
    }

    #[tokio::test]
    async fn test_probability_midpoint() {
        let clock = Arc::new(FixedClock::new(start()));
        let mgr = manager(clock.clone(), FixedDraw::new(0.6));
        let record = mgr.store(MediaKind::Audio, "u1", b"pcm").await.unwrap();

        clock.advance(Duration::seconds(62 * 60 + 30));
        assert!((mgr.probability(&record) - 0.5).abs() < 1e-9);
        assert!(!mgr.should_admit(&record));
    }

    #[tokio::test]
    async fn test_mark_loaded_and_parsed_persist() {
        let clock = Arc::new(FixedClock::new(start()));
        let mgr = manager(clock.clone(), FixedDraw::always_admit());
        let record = mgr.store(MediaKind::Text, "u1", b"notes").await.unwrap();

        clock.advance(Duration::minutes(3));
        let record = mgr.mark_loaded(record).await.unwrap();
        clock.advance(Duration::seconds(1));
        let record = mgr.mark_parsed(record).await.unwrap();

        let stored = mgr.vault().load(&record.id).await.unwrap();
        assert_eq!(stored.time_last_loaded, Some(start() + Duration::minutes(3)));
        assert_eq!(
            stored.time_last_parsed,
            Some(start() + Duration::minutes(3) + Duration::seconds(1))
        );
    }

    #[tokio::test]
    async fn test_mark_timestamps_never_precede_predecessor() {
        let clock = Arc::new(FixedClock::new(start()));
        let mgr = manager(clock.clone(), FixedDraw::always_admit());
        let record = mgr.store(MediaKind::Video, "u1", b"frames").await.unwrap();

        // Clock stepped backwards.
        clock.set(start() - Duration::hours(1));
        let record = mgr.mark_loaded(record).await.unwrap();
        assert_eq!(record.time_last_loaded, Some(start()));
        let record = mgr.mark_parsed(record).await.unwrap();
        assert_eq!(record.time_last_parsed, Some(start()));
    }

    #[tokio::test]
    async fn test_cleanup_deletes_only_expired() {
        let clock = Arc::new(FixedClock::new(start()));
        let mgr = manager(clock.clone(), FixedDraw::always_admit());

        let old = mgr.store(MediaKind::Photo, "u1", b"old").await.unwrap();
        clock.advance(Duration::minutes(60));
        let young = mgr.store(MediaKind::Photo, "u1", b"young").await.unwrap();
        clock.advance(Duration::minutes(35));

        let deleted = mgr.cleanup_aged().await.unwrap();
        assert_eq!(deleted, BTreeSet::from([old.id.clone()]));
        assert!(!mgr.vault().exists(&old.id).await.unwrap());
        assert!(mgr.vault().exists(&young.id).await.unwrap());

        assert!(mgr.cleanup_aged().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_media_status_report() {
        let clock = Arc::new(FixedClock::new(start()));
        let mgr = manager(clock.clone(), FixedDraw::always_admit());
        let record = mgr
            .store_with_id("status-1", MediaKind::Audio, "u9", b"x")
            .await
            .unwrap();

        clock.advance(Duration::minutes(95));
        let status = mgr.media_status(&record.id).await.unwrap();
        assert_eq!(status.media_id, "status-1");
        assert_eq!(status.media_kind, MediaKind::Audio);
        assert!(status.decay.expired);
        assert_eq!(status.decay.probability, 0.0);
        assert!(status.time_last_loaded.is_none());
    }

    #[tokio::test]
    async fn test_store_with_id_kind_conflict() {
        let clock = Arc::new(FixedClock::new(start()));
        let mgr = manager(clock, FixedDraw::always_admit());
        mgr.store_with_id("same", MediaKind::Photo, "u1", b"a")
            .await
            .unwrap();
        let err = mgr
            .store_with_id("same", MediaKind::Text, "u1", b"b")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::KindConflict { .. }));
    }

    #[tokio::test]
    async fn test_cleanup_keeps_record_restored_mid_pass() {
        let clock = Arc::new(FixedClock::new(start()));
        let inner = vault();
        let writer = LifecycleManager::builder(inner.clone())
            .with_clock(clock.clone())
            .build();
        writer
            .store_with_id("reused", MediaKind::Video, "u1", b"old")
            .await
            .unwrap();

        clock.advance(Duration::minutes(95));
        let fresh_content = lethe_crypto::encrypt(b"new").unwrap();
        let fresh =
            MediaRecord::new("reused", MediaKind::Video, "u1", fresh_content, clock.now()).unwrap();

        let racing = Arc::new(RestoreAfterLoad {
            inner: inner.clone(),
            replacement: std::sync::Mutex::new(Some(fresh.clone())),
        });
        let mgr = LifecycleManager::builder(racing)
            .with_clock(clock.clone())
            .build();

        let deleted = mgr.cleanup_aged().await.unwrap();
        assert!(deleted.is_empty());
        assert_eq!(inner.load("reused").await.unwrap(), fresh);
    }
}
