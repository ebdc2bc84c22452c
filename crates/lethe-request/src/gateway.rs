//! The request gate: expiry, then kind, then probability, then release.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use lethe_core::{new_v7_at, MediaKind, MediaRecord, Result};
use lethe_lifecycle::LifecycleManager;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::log::RequestLog;
use crate::models::{Denial, RequestEnvelope, RequestStatus, ResponseEnvelope};
use crate::protocol::MediaRequestProtocol;

/// Default [`MediaRequestProtocol`] implementation backed by a
/// [`LifecycleManager`].
///
/// Every request resolves synchronously to `Completed`, `Denied` or
/// `Expired`. Checks run in a fixed order so the caller always learns the
/// most fundamental reason first:
///
/// 1. missing record: `Err(MediaNotFound)`
/// 2. expired: `Expired`, probability 0.0
/// 3. kind mismatch: `Denied`, probability still reported
/// 4. failed admission draw: `Denied`
/// 5. decrypt, stamp loaded/parsed, `Completed`
#[derive(Debug)]
pub struct RequestGateway {
    manager: Arc<LifecycleManager>,
    log: RequestLog,
}

impl RequestGateway {
    pub fn new(manager: Arc<LifecycleManager>) -> Self {
        Self::with_log(manager, RequestLog::default())
    }

    pub fn with_log(manager: Arc<LifecycleManager>, log: RequestLog) -> Self {
        Self { manager, log }
    }

    pub fn manager(&self) -> &Arc<LifecycleManager> {
        &self.manager
    }

    pub fn log(&self) -> &RequestLog {
        &self.log
    }

    fn respond(
        &self,
        request_id: Uuid,
        record: &MediaRecord,
        status: RequestStatus,
        probability: f64,
        denial: Option<Denial>,
        content: Option<Vec<u8>>,
    ) -> ResponseEnvelope {
        let response = ResponseEnvelope {
            request_id,
            media_id: record.id.clone(),
            status,
            content,
            media_kind: Some(record.media_kind),
            probability,
            denial,
            response_time: self.manager.now(),
        };
        self.log.record(&response);
        response
    }

    /// Decrypt, stamp access times, and release content.
    async fn release(
        &self,
        request_id: Uuid,
        record: MediaRecord,
        probability: f64,
    ) -> Result<ResponseEnvelope> {
        let plaintext = lethe_crypto::decrypt(
            &record.cipher_content,
            &record.content_key,
            &record.integrity_digest,
        )
        .map_err(|e| {
            warn!(media_id = %record.id, error = %e, "Inner content failed verification");
            lethe_core::Error::from(e)
        })?;

        let record = self.manager.mark_loaded(record).await?;
        let record = self.manager.mark_parsed(record).await?;

        Ok(self.respond(
            request_id,
            &record,
            RequestStatus::Completed,
            probability,
            None,
            Some(plaintext),
        ))
    }
}

#[async_trait]
impl MediaRequestProtocol for RequestGateway {
    async fn request_media(&self, request: &RequestEnvelope) -> Result<ResponseEnvelope> {
        let request_id = new_v7_at(&self.manager.now());
        let record = self.manager.vault().load(&request.media_id).await?;
        let status = self.manager.get_status(&record);

        if status.expired {
            debug!(
                %request_id,
                media_id = %record.id,
                requester_id = %request.requester_id,
                age_minutes = status.age_minutes,
                "Request expired"
            );
            return Ok(self.respond(
                request_id,
                &record,
                RequestStatus::Expired,
                0.0,
                Some(Denial::expired(status.age_minutes)),
                None,
            ));
        }

        if record.media_kind != request.requested_kind {
            debug!(
                %request_id,
                media_id = %record.id,
                requester_id = %request.requester_id,
                requested = %request.requested_kind,
                actual = %record.media_kind,
                "Request denied on kind mismatch"
            );
            return Ok(self.respond(
                request_id,
                &record,
                RequestStatus::Denied,
                status.probability,
                Some(Denial::kind_mismatch(
                    request.requested_kind,
                    record.media_kind,
                )),
                None,
            ));
        }

        if !self.manager.should_admit(&record) {
            debug!(
                %request_id,
                media_id = %record.id,
                requester_id = %request.requester_id,
                probability = status.probability,
                "Request denied by probability gate"
            );
            return Ok(self.respond(
                request_id,
                &record,
                RequestStatus::Denied,
                status.probability,
                Some(Denial::probability_gate(status.probability)),
                None,
            ));
        }

        let response = self.release(request_id, record, status.probability).await?;
        debug!(
            %request_id,
            media_id = %response.media_id,
            requester_id = %request.requester_id,
            probability = status.probability,
            "Request completed"
        );
        Ok(response)
    }

    async fn request_status(&self, request_id: Uuid) -> Result<ResponseEnvelope> {
        self.log
            .get(request_id)
            .ok_or(lethe_core::Error::RequestNotFound(request_id))
    }

    async fn cancel_request(&self, request_id: Uuid) -> Result<bool> {
        match self.log.get(request_id) {
            Some(response) if !response.status.is_terminal() => {
                self.log.remove(request_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_ids_by_kind(
        &self,
        kind: MediaKind,
        requester_id: &str,
    ) -> Result<BTreeSet<String>> {
        let ids = self.manager.vault().list_by_kind(kind).await?;
        debug!(media_kind = %kind, requester_id, count = ids.len(), "Listed media ids");
        Ok(ids)
    }
}
