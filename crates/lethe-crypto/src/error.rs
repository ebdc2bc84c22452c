//! Error types for cryptographic operations.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Token failed verification: tampered, wrong key, or malformed header.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Decrypted plaintext does not match the expected digest.
    #[error("Integrity check failed: expected digest {expected}, got {actual}")]
    Integrity { expected: String, actual: String },

    /// Key material has the wrong shape.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Key derivation failed.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Host facts could not be collected.
    #[error("Host facts unavailable: {0}")]
    HostFacts(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

impl From<CryptoError> for lethe_core::Error {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Authentication(msg) => lethe_core::Error::Authentication(msg),
            e @ CryptoError::Integrity { .. } => lethe_core::Error::Integrity(e.to_string()),
            CryptoError::InvalidKey(msg) => lethe_core::Error::InvalidInput(msg),
            CryptoError::KeyDerivation(msg) | CryptoError::HostFacts(msg) => {
                lethe_core::Error::Config(msg)
            }
            CryptoError::Encryption(msg) => lethe_core::Error::Internal(msg),
        }
    }
}
