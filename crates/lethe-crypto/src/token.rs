//! Self-describing authenticated token used by both encryption layers.
//!
//! ```text
//! ┌────────────┬─────────┬───────────────────┬────────────┬──────────────────────┐
//! │ "LTHE" (4) │ ver (1) │ issued_at u64 BE  │ nonce (12) │ AES-256-GCM ct + tag │
//! └────────────┴─────────┴───────────────────┴────────────┴──────────────────────┘
//!  \____________ header (AAD) ______________/
//! ```
//!
//! The header is bound into the GCM tag, so the embedded timestamp cannot be
//! altered without failing verification.

use chrono::{DateTime, TimeZone, Utc};

use crate::cipher::{aes_gcm_decrypt, aes_gcm_encrypt, generate_nonce, NONCE_LEN, TAG_LEN};
use crate::error::{CryptoError, CryptoResult};

/// Magic bytes at the start of every token.
pub const TOKEN_MAGIC: &[u8; 4] = b"LTHE";

/// Current token format version.
pub const TOKEN_VERSION: u8 = 1;

/// Bytes covered by the associated data.
pub const HEADER_LEN: usize = TOKEN_MAGIC.len() + 1 + 8;

/// Smallest possible token (empty plaintext).
pub const MIN_TOKEN_LEN: usize = HEADER_LEN + NONCE_LEN + TAG_LEN;

/// Seal `plaintext` under `key`, stamped with the current time.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    seal_at(key, plaintext, Utc::now())
}

/// Seal `plaintext` under `key` with an explicit issue time.
pub fn seal_at(
    key: &[u8; 32],
    plaintext: &[u8],
    issued_at: DateTime<Utc>,
) -> CryptoResult<Vec<u8>> {
    let header = encode_header(issued_at);
    let nonce = generate_nonce();
    let ciphertext = aes_gcm_encrypt(key, &nonce, plaintext, &header)?;

    let mut token = Vec::with_capacity(HEADER_LEN + NONCE_LEN + ciphertext.len());
    token.extend_from_slice(&header);
    token.extend_from_slice(&nonce);
    token.extend_from_slice(&ciphertext);
    Ok(token)
}

/// Verify and decrypt a token.
///
/// Every failure, including a truncated token or an unknown header, is
/// reported as [`CryptoError::Authentication`].
pub fn open(key: &[u8; 32], token: &[u8]) -> CryptoResult<Vec<u8>> {
    check_header(token)?;

    let (header, rest) = token.split_at(HEADER_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    let nonce: [u8; NONCE_LEN] = nonce
        .try_into()
        .map_err(|_| CryptoError::Authentication("malformed nonce".into()))?;

    aes_gcm_decrypt(key, &nonce, ciphertext, header)
}

/// Read the issue timestamp from a token without a key.
///
/// The value is unauthenticated until the token is opened.
pub fn token_issued_at(token: &[u8]) -> CryptoResult<DateTime<Utc>> {
    check_header(token)?;

    let mut secs = [0u8; 8];
    secs.copy_from_slice(&token[TOKEN_MAGIC.len() + 1..HEADER_LEN]);
    let secs = i64::try_from(u64::from_be_bytes(secs))
        .map_err(|_| CryptoError::Authentication("timestamp out of range".into()))?;

    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| CryptoError::Authentication("timestamp out of range".into()))
}

fn encode_header(issued_at: DateTime<Utc>) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[..TOKEN_MAGIC.len()].copy_from_slice(TOKEN_MAGIC);
    header[TOKEN_MAGIC.len()] = TOKEN_VERSION;
    let secs = issued_at.timestamp().max(0) as u64;
    header[TOKEN_MAGIC.len() + 1..].copy_from_slice(&secs.to_be_bytes());
    header
}

fn check_header(token: &[u8]) -> CryptoResult<()> {
    if token.len() < MIN_TOKEN_LEN {
        return Err(CryptoError::Authentication(format!(
            "token too short ({} bytes, minimum {})",
            token.len(),
            MIN_TOKEN_LEN
        )));
    }
    if &token[..TOKEN_MAGIC.len()] != TOKEN_MAGIC {
        return Err(CryptoError::Authentication("invalid token magic".into()));
    }
    let version = token[TOKEN_MAGIC.len()];
    if version != TOKEN_VERSION {
        return Err(CryptoError::Authentication(format!(
            "unsupported token version {}",
            version
        )));
    }
    Ok(())
}
