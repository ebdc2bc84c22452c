//! Request and response envelopes.
//!
//! Envelopes are transient: nothing here is persisted with the vault.

use std::fmt;

use chrono::{DateTime, Utc};
use lethe_core::MediaKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-declared priority. Informational only: requests are handled
/// synchronously in arrival order regardless of priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Outcome of a request.
///
/// Only `Denied`, `Expired` and `Completed` are produced by the synchronous
/// gateway. `Pending`, `Approved` and `Processing` are reserved for a future
/// queueing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
    Processing,
    Completed,
    Expired,
}

impl RequestStatus {
    /// Whether no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Denied | RequestStatus::Completed | RequestStatus::Expired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Denied => "denied",
            RequestStatus::Processing => "processing",
            RequestStatus::Completed => "completed",
            RequestStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request for the decrypted content of one stored object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub media_id: String,
    pub requested_kind: MediaKind,
    pub requester_id: String,
    #[serde(default)]
    pub priority: RequestPriority,
    pub request_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RequestEnvelope {
    /// New request at normal priority, stamped with the current time.
    pub fn new(
        media_id: impl Into<String>,
        requested_kind: MediaKind,
        requester_id: impl Into<String>,
    ) -> Self {
        Self {
            media_id: media_id.into(),
            requested_kind,
            requester_id: requester_id.into(),
            priority: RequestPriority::default(),
            request_time: Utc::now(),
            reason: None,
        }
    }

    pub fn with_priority(mut self, priority: RequestPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Machine-readable cause of a `Denied` or `Expired` outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum DenialReason {
    /// Record is at or past the zero-probability age.
    Expired,
    /// Requested kind differs from the stored kind.
    KindMismatch {
        requested: MediaKind,
        actual: MediaKind,
    },
    /// The probabilistic admission draw failed.
    ProbabilityGate,
}

/// Denial cause plus a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denial {
    pub reason: DenialReason,
    pub message: String,
}

impl Denial {
    pub fn expired(age_minutes: f64) -> Self {
        Self {
            reason: DenialReason::Expired,
            message: format!("Media has aged out ({:.1} minutes old)", age_minutes),
        }
    }

    pub fn kind_mismatch(requested: MediaKind, actual: MediaKind) -> Self {
        Self {
            reason: DenialReason::KindMismatch { requested, actual },
            message: format!("Type mismatch: requested {}, found {}", requested, actual),
        }
    }

    pub fn probability_gate(probability: f64) -> Self {
        Self {
            reason: DenialReason::ProbabilityGate,
            message: format!(
                "Probability gate failed (probability: {:.1}%)",
                probability * 100.0
            ),
        }
    }
}

/// Result of one request.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub request_id: Uuid,
    pub media_id: String,
    pub status: RequestStatus,
    /// Decrypted bytes, present only when `status` is `Completed`.
    #[serde(default, with = "base64_opt", skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_kind: Option<MediaKind>,
    /// Access probability at decision time.
    pub probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denial: Option<Denial>,
    pub response_time: DateTime<Utc>,
}

impl ResponseEnvelope {
    pub fn is_completed(&self) -> bool {
        self.status == RequestStatus::Completed
    }

    /// Human-readable denial message, if any.
    pub fn denial_message(&self) -> Option<&str> {
        self.denial.as_ref().map(|d| d.message.as_str())
    }

    /// Copy with decrypted content removed.
    pub fn summary(&self) -> Self {
        Self {
            content: None,
            ..self.clone()
        }
    }
}

impl fmt::Debug for ResponseEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseEnvelope")
            .field("request_id", &self.request_id)
            .field("media_id", &self.media_id)
            .field("status", &self.status)
            .field("content_len", &self.content.as_ref().map(Vec::len))
            .field("media_kind", &self.media_kind)
            .field("probability", &self.probability)
            .field("denial", &self.denial)
            .field("response_time", &self.response_time)
            .finish()
    }
}

/// Serde helper for optional base64-encoded bytes.
mod base64_opt {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(b) => {
                serializer.serialize_some(&base64::engine::general_purpose::STANDARD.encode(b))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| {
            base64::engine::general_purpose::STANDARD
                .decode(&s)
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}
