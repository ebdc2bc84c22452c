//! Error types for the lethe media vault.

use thiserror::Error;
use uuid::Uuid;

use crate::models::MediaKind;

/// Result type alias using lethe's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for vault, lifecycle and request operations.
///
/// Gate outcomes (denied / expired) are never errors; they are returned as
/// response values. Everything here is fatal to the single call.
#[derive(Error, Debug)]
pub enum Error {
    /// No record exists for the id in any partition.
    #[error("Media not found: {0}")]
    MediaNotFound(String),

    /// Ciphertext failed its authentication tag (tampered or wrong key).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Decrypted content does not match the recorded digest.
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    /// The outer layer could not be opened with the host-derived key.
    #[error("Outer decryption failed for media '{media_id}': {reason}")]
    OuterDecrypt { media_id: String, reason: String },

    /// An id is already stored under a different media kind.
    #[error("Media '{media_id}' already stored as {existing}, cannot save as {requested}")]
    KindConflict {
        media_id: String,
        existing: MediaKind,
        requested: MediaKind,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No request with this id is tracked.
    #[error("Request not found: {0}")]
    RequestNotFound(Uuid),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error indicates tampering or an environment mismatch
    /// that operators should be alerted to.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            Error::Authentication(_) | Error::Integrity(_) | Error::OuterDecrypt { .. }
        )
    }

    /// Whether retrying the same call could succeed.
    ///
    /// Cryptographic failures never qualify: the same inputs produce the same
    /// failure. Only I/O errors are considered transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_media_not_found() {
        let err = Error::MediaNotFound("abc".to_string());
        assert_eq!(err.to_string(), "Media not found: abc");
    }

    #[test]
    fn test_error_display_outer_decrypt() {
        let err = Error::OuterDecrypt {
            media_id: "m1".to_string(),
            reason: "host key mismatch".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Outer decryption failed for media 'm1': host key mismatch"
        );
    }

    #[test]
    fn test_error_display_kind_conflict() {
        let err = Error::KindConflict {
            media_id: "m1".to_string(),
            existing: MediaKind::Photo,
            requested: MediaKind::Video,
        };
        let msg = err.to_string();
        assert!(msg.contains("photo"));
        assert!(msg.contains("video"));
    }

    #[test]
    fn test_error_display_request_not_found() {
        let id = Uuid::nil();
        let err = Error::RequestNotFound(id);
        assert_eq!(err.to_string(), format!("Request not found: {}", id));
    }

    #[test]
    fn test_security_events() {
        assert!(Error::Authentication("x".into()).is_security_event());
        assert!(Error::Integrity("x".into()).is_security_event());
        assert!(Error::OuterDecrypt {
            media_id: "m".into(),
            reason: "r".into()
        }
        .is_security_event());
        assert!(!Error::MediaNotFound("m".into()).is_security_event());
    }

    #[test]
    fn test_crypto_failures_not_retryable() {
        assert!(!Error::Authentication("x".into()).is_retryable());
        assert!(!Error::Integrity("x".into()).is_retryable());
        assert!(!Error::MediaNotFound("m".into()).is_retryable());

        let io_err = std::io::Error::new(std::io::ErrorKind::Interrupted, "eintr");
        assert!(Error::from(io_err).is_retryable());
    }

    #[test]
    fn test_serde_json_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
