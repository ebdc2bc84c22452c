//! Host-bound key derivation for the outer storage layer.
//!
//! The outer key is a pure function of a few quasi-stable host facts. The
//! same facts always give the same key; moving a store to hardware with
//! different facts makes its outer layer unreadable. This is a portability
//! barrier, not secrecy against an attacker who controls the host.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use sysinfo::System;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// Separator between canonical host fields.
pub const FACT_SEPARATOR: &str = "|";

/// Quasi-stable facts about the machine a store lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostFacts {
    pub total_memory_bytes: u64,
    pub logical_cpus: usize,
    /// Processor model string. May be empty on some platforms.
    pub processor: String,
    pub architecture: String,
    pub os_name: String,
}

impl HostFacts {
    /// Fixed-order canonical encoding fed into the key hash.
    ///
    /// An empty processor string is replaced by the architecture.
    pub fn canonical(&self) -> String {
        let processor = if self.processor.trim().is_empty() {
            self.architecture.as_str()
        } else {
            self.processor.as_str()
        };
        [
            self.total_memory_bytes.to_string(),
            self.logical_cpus.to_string(),
            processor.to_string(),
            self.architecture.clone(),
            self.os_name.clone(),
        ]
        .join(FACT_SEPARATOR)
    }
}

/// Source of host facts.
pub trait HostFactsProvider: Send + Sync {
    fn host_facts(&self) -> CryptoResult<HostFacts>;
}

/// Live introspection of the current machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostFacts;

impl HostFactsProvider for SystemHostFacts {
    fn host_facts(&self) -> CryptoResult<HostFacts> {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();

        let logical_cpus = sys.cpus().len();
        if logical_cpus == 0 {
            return Err(CryptoError::HostFacts("no processors reported".into()));
        }

        let processor = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .unwrap_or_default();

        Ok(HostFacts {
            total_memory_bytes: sys.total_memory(),
            logical_cpus,
            processor,
            architecture: std::env::consts::ARCH.to_string(),
            os_name: std::env::consts::OS.to_string(),
        })
    }
}

/// Fixed facts, for tests and pinned deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticHostFacts(pub HostFacts);

impl HostFactsProvider for StaticHostFacts {
    fn host_facts(&self) -> CryptoResult<HostFacts> {
        Ok(self.0.clone())
    }
}

/// Key wrapper with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct DerivedKey {
    key: [u8; 32],
}

impl DerivedKey {
    /// Create a derived key from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { key: bytes }
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Hash the canonical host string `iterations` times with SHA-256.
///
/// Each round hashes the previous round's output. `iterations` must be at
/// least 1.
pub fn derive_host_key(facts: &HostFacts, iterations: u32) -> CryptoResult<DerivedKey> {
    if iterations == 0 {
        return Err(CryptoError::KeyDerivation(
            "iterations must be at least 1".into(),
        ));
    }

    let mut digest: [u8; 32] = Sha256::digest(facts.canonical().as_bytes()).into();
    for _ in 1..iterations {
        let next: [u8; 32] = Sha256::digest(digest).into();
        digest.zeroize();
        digest = next;
    }

    let key = DerivedKey::from_bytes(digest);
    digest.zeroize();
    Ok(key)
}

/// Derives the outer key from an injected facts provider.
#[derive(Clone)]
pub struct HostKeyDeriver {
    provider: Arc<dyn HostFactsProvider>,
    iterations: u32,
}

impl HostKeyDeriver {
    pub fn new(provider: Arc<dyn HostFactsProvider>, iterations: u32) -> CryptoResult<Self> {
        if iterations == 0 {
            return Err(CryptoError::KeyDerivation(
                "iterations must be at least 1".into(),
            ));
        }
        Ok(Self {
            provider,
            iterations,
        })
    }

    /// Deriver over live host facts.
    pub fn system(iterations: u32) -> CryptoResult<Self> {
        Self::new(Arc::new(SystemHostFacts), iterations)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Collect facts and derive the key.
    pub fn derive_key(&self) -> CryptoResult<DerivedKey> {
        let facts = self.provider.host_facts()?;
        tracing::debug!(
            iterations = self.iterations,
            logical_cpus = facts.logical_cpus,
            architecture = %facts.architecture,
            os_name = %facts.os_name,
            "Deriving host key"
        );
        derive_host_key(&facts, self.iterations)
    }
}

impl std::fmt::Debug for HostKeyDeriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostKeyDeriver")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}
