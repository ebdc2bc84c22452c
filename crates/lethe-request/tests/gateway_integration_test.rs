//! End-to-end request tests: filesystem vault, lifecycle manager, gateway.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use lethe_core::{Error, FixedClock, FixedDraw, MediaKind};
use lethe_crypto::{HostFacts, HostFactsProvider, StaticHostFacts};
use lethe_lifecycle::LifecycleManager;
use lethe_request::{
    DenialReason, MediaRequestProtocol, RequestEnvelope, RequestGateway, RequestPriority,
    RequestStatus,
};
use lethe_store::{FsVault, StoreConfig};
use tempfile::TempDir;

fn host(memory: u64) -> Arc<dyn HostFactsProvider> {
    Arc::new(StaticHostFacts(HostFacts {
        total_memory_bytes: memory,
        logical_cpus: 8,
        processor: "Gateway Integration CPU".into(),
        architecture: "x86_64".into(),
        os_name: "linux".into(),
    }))
}

async fn gateway(dir: &TempDir, memory: u64) -> (Arc<FixedClock>, RequestGateway) {
    let config = StoreConfig::default().with_root(dir.path());
    let vault = FsVault::open(&config, host(memory)).await.unwrap();
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap(),
    ));
    let manager = LifecycleManager::builder(Arc::new(vault))
        .with_clock(clock.clone())
        .with_draw(Arc::new(FixedDraw::always_admit()))
        .build();
    (clock, RequestGateway::new(Arc::new(manager)))
}

#[tokio::test]
async fn test_three_kind_scenario() {
    let dir = TempDir::new().unwrap();
    let (_clock, gw) = gateway(&dir, 16 << 30).await;

    let photo = gw
        .manager()
        .store(MediaKind::Photo, "owner-1", b"photo bytes")
        .await
        .unwrap();
    gw.manager()
        .store(MediaKind::Video, "owner-1", b"video bytes")
        .await
        .unwrap();
    gw.manager()
        .store(MediaKind::Audio, "owner-1", b"audio bytes")
        .await
        .unwrap();

    let photos = gw
        .list_ids_by_kind(MediaKind::Photo, "agent-1")
        .await
        .unwrap();
    assert_eq!(photos, BTreeSet::from([photo.id.clone()]));

    let denied = gw
        .request_media(&RequestEnvelope::new(&photo.id, MediaKind::Video, "agent-1"))
        .await
        .unwrap();
    assert_eq!(denied.status, RequestStatus::Denied);
    assert!(denied.content.is_none());
    assert_eq!(
        denied.denial.as_ref().map(|d| d.reason),
        Some(DenialReason::KindMismatch {
            requested: MediaKind::Video,
            actual: MediaKind::Photo,
        })
    );
    let message = denied.denial_message().unwrap();
    assert!(message.contains("photo") && message.contains("video"));

    let completed = gw
        .request_media(
            &RequestEnvelope::new(&photo.id, MediaKind::Photo, "agent-1")
                .with_priority(RequestPriority::Critical)
                .with_reason("thumbnail"),
        )
        .await
        .unwrap();
    assert_eq!(completed.status, RequestStatus::Completed);
    assert_eq!(completed.content.as_deref(), Some(b"photo bytes".as_slice()));
    assert_eq!(completed.media_kind, Some(MediaKind::Photo));
}

#[tokio::test]
async fn test_expired_request_then_cleanup() {
    let dir = TempDir::new().unwrap();
    let (clock, gw) = gateway(&dir, 16 << 30).await;

    let record = gw
        .manager()
        .store(MediaKind::Text, "owner-2", b"ephemeral")
        .await
        .unwrap();
    clock.advance(Duration::minutes(95));

    let resp = gw
        .request_media(&RequestEnvelope::new(&record.id, MediaKind::Text, "agent-2"))
        .await
        .unwrap();
    assert_eq!(resp.status, RequestStatus::Expired);
    assert_eq!(resp.probability, 0.0);

    let deleted = gw.manager().cleanup_aged().await.unwrap();
    assert!(deleted.contains(&record.id));
    assert!(matches!(
        gw.request_media(&RequestEnvelope::new(&record.id, MediaKind::Text, "agent-2"))
            .await,
        Err(Error::MediaNotFound(_))
    ));

    // The earlier outcome is still visible in the request log.
    let status = gw.request_status(resp.request_id).await.unwrap();
    assert_eq!(status.status, RequestStatus::Expired);
}

#[tokio::test]
async fn test_moved_store_fails_requests() {
    let dir = TempDir::new().unwrap();
    let (_clock, gw) = gateway(&dir, 16 << 30).await;
    let record = gw
        .manager()
        .store(MediaKind::Photo, "owner-3", b"bound to host")
        .await
        .unwrap();

    let (_clock, moved) = gateway(&dir, 32 << 30).await;

    // Listing still works because it never opens records.
    assert_eq!(
        moved
            .list_ids_by_kind(MediaKind::Photo, "agent-3")
            .await
            .unwrap(),
        BTreeSet::from([record.id.clone()])
    );
    assert!(matches!(
        moved
            .request_media(&RequestEnvelope::new(&record.id, MediaKind::Photo, "agent-3"))
            .await,
        Err(Error::OuterDecrypt { .. })
    ));
}
