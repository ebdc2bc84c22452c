//! Inner, per-object encryption of media content.
//!
//! Each object gets a fresh random 256-bit key. The plaintext digest is
//! recorded alongside so that decryption can prove it recovered exactly the
//! bytes that were stored.

use lethe_core::{EncryptedContent, CONTENT_KEY_LEN, DIGEST_LEN};
use sha2::{Digest, Sha256};

use crate::cipher::generate_random;
use crate::error::{CryptoError, CryptoResult};
use crate::token;

/// Generate a fresh random content key.
pub fn generate_content_key() -> [u8; CONTENT_KEY_LEN] {
    generate_random()
}

/// SHA-256 of `data`.
pub fn digest(data: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(data).into()
}

/// Check `data` against an expected digest.
pub fn verify_digest(data: &[u8], expected: &[u8; DIGEST_LEN]) -> CryptoResult<()> {
    let actual = digest(data);
    if &actual != expected {
        return Err(CryptoError::Integrity {
            expected: hex::encode(expected),
            actual: hex::encode(actual),
        });
    }
    Ok(())
}

/// Encrypt `plaintext` under a freshly generated key.
///
/// Two calls on the same plaintext produce different ciphertexts and keys
/// but the same digest.
pub fn encrypt(plaintext: &[u8]) -> CryptoResult<EncryptedContent> {
    let key = generate_content_key();
    let ciphertext = token::seal(&key, plaintext)?;
    Ok(EncryptedContent {
        ciphertext,
        key,
        digest: digest(plaintext),
    })
}

/// Decrypt and verify content.
///
/// Fails with [`CryptoError::Authentication`] if the token does not verify
/// under `key`, and with [`CryptoError::Integrity`] if the recovered
/// plaintext does not hash to `expected_digest`. Unverified plaintext is
/// never returned.
pub fn decrypt(
    ciphertext: &[u8],
    key: &[u8; CONTENT_KEY_LEN],
    expected_digest: &[u8; DIGEST_LEN],
) -> CryptoResult<Vec<u8>> {
    let plaintext = token::open(key, ciphertext)?;
    verify_digest(&plaintext, expected_digest)?;
    Ok(plaintext)
}
