//! # lethe-crypto
//!
//! Cryptographic primitives for the lethe media vault.
//!
//! Two layers protect every stored object:
//!
//! - **Inner layer** ([`content`]): each media payload is sealed under its own
//!   random 256-bit key, with a SHA-256 digest of the plaintext recorded for
//!   integrity verification.
//! - **Outer layer** ([`host`]): the serialized record is sealed again under a
//!   key derived from host facts, binding the store to the machine it was
//!   written on.
//!
//! Both layers use the same [`token`] format.
//!
//! ## Cryptographic Primitives
//!
//! - **Symmetric cipher**: AES-256-GCM (AEAD), header bound as associated data
//! - **Digest**: SHA-256
//! - **Host key**: iterated SHA-256 over canonical host facts
//! - **Random generation**: `rand::thread_rng` (ChaCha-based CSPRNG)
//!
//! ## Example
//!
//! ```rust
//! use lethe_crypto::content::{decrypt, encrypt};
//!
//! let sealed = encrypt(b"raw frame").unwrap();
//! let plain = decrypt(&sealed.ciphertext, &sealed.key, &sealed.digest).unwrap();
//! assert_eq!(plain, b"raw frame");
//! ```

pub mod cipher;
pub mod content;
pub mod error;
pub mod host;
pub mod token;

pub use content::{decrypt, digest, encrypt, generate_content_key, verify_digest};
pub use error::{CryptoError, CryptoResult};
pub use host::{
    derive_host_key, DerivedKey, HostFacts, HostFactsProvider, HostKeyDeriver, StaticHostFacts,
    SystemHostFacts,
};
pub use token::{open, seal, seal_at, token_issued_at};
