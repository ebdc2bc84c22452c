//! AES-256-GCM cipher operations.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};

/// Nonce width for AES-GCM.
pub const NONCE_LEN: usize = 12;

/// Authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Generate cryptographically secure random bytes.
pub fn generate_random<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate a random nonce (12 bytes).
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    generate_random()
}

/// Encrypt plaintext with AES-256-GCM, binding `aad` into the tag.
///
/// Returns ciphertext with appended authentication tag (16 bytes).
pub fn aes_gcm_encrypt(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Encryption("AES-GCM encryption failed".into()))
}

/// Decrypt ciphertext with AES-256-GCM.
///
/// The ciphertext must include the authentication tag (16 bytes) at the end
/// and `aad` must match what was supplied at encryption.
pub fn aes_gcm_decrypt(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Authentication("AES-GCM tag verification failed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_nonce() {
        let nonce1 = generate_nonce();
        let nonce2 = generate_nonce();
        assert_ne!(nonce1, nonce2);
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = [42u8; 32];
        let nonce = [1u8; 12];
        let plaintext = b"raw sensor frame";

        let ciphertext = aes_gcm_encrypt(&key, &nonce, plaintext, b"hdr").unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);

        let decrypted = aes_gcm_decrypt(&key, &nonce, &ciphertext, b"hdr").unwrap();
        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let nonce = [1u8; 12];
        let ciphertext = aes_gcm_encrypt(&[42u8; 32], &nonce, b"secret", b"").unwrap();
        let result = aes_gcm_decrypt(&[99u8; 32], &nonce, &ciphertext, b"");
        assert!(matches!(result, Err(CryptoError::Authentication(_))));
    }

    #[test]
    fn test_decrypt_wrong_aad() {
        let key = [42u8; 32];
        let nonce = [1u8; 12];
        let ciphertext = aes_gcm_encrypt(&key, &nonce, b"secret", b"header-a").unwrap();
        let result = aes_gcm_decrypt(&key, &nonce, &ciphertext, b"header-b");
        assert!(matches!(result, Err(CryptoError::Authentication(_))));
    }

    #[test]
    fn test_decrypt_tampered_ciphertext() {
        let key = [42u8; 32];
        let nonce = [1u8; 12];
        let mut ciphertext = aes_gcm_encrypt(&key, &nonce, b"secret", b"").unwrap();
        ciphertext[0] ^= 0xFF;
        let result = aes_gcm_decrypt(&key, &nonce, &ciphertext, b"");
        assert!(matches!(result, Err(CryptoError::Authentication(_))));
    }

    #[test]
    fn test_encrypt_empty_plaintext() {
        let key = [42u8; 32];
        let nonce = [1u8; 12];
        let ciphertext = aes_gcm_encrypt(&key, &nonce, b"", b"").unwrap();
        let decrypted = aes_gcm_decrypt(&key, &nonce, &ciphertext, b"").unwrap();
        assert!(decrypted.is_empty());
    }
}
