//! The request protocol exposed to media consumers.

use std::collections::BTreeSet;

use async_trait::async_trait;
use lethe_core::{MediaKind, Result};
use uuid::Uuid;

use crate::models::{RequestEnvelope, ResponseEnvelope};

/// Protocol that media request handlers implement.
///
/// Gate outcomes (`Denied`, `Expired`) are returned as responses. `Err` is
/// reserved for missing media and for storage or cryptographic failures.
#[async_trait]
pub trait MediaRequestProtocol: Send + Sync {
    /// Run one request through the gate.
    async fn request_media(&self, request: &RequestEnvelope) -> Result<ResponseEnvelope>;

    /// Summary of an earlier response (content is never retained).
    ///
    /// Fails with `Error::RequestNotFound` for unknown or evicted ids.
    async fn request_status(&self, request_id: Uuid) -> Result<ResponseEnvelope>;

    /// Cancel a request that has not reached a terminal status.
    ///
    /// Returns `false` for unknown requests and for requests that already
    /// finished.
    async fn cancel_request(&self, request_id: Uuid) -> Result<bool>;

    /// Ids stored under `kind`, from partition listing alone.
    ///
    /// `requester_id` is recorded for audit and does not filter results.
    async fn list_ids_by_kind(
        &self,
        kind: MediaKind,
        requester_id: &str,
    ) -> Result<BTreeSet<String>>;
}
