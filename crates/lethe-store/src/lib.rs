//! # lethe-store
//!
//! Storage for the lethe media vault.
//!
//! - [`PartitionBackend`]: raw bytes keyed by `(media kind, id)`, with
//!   [`FilesystemBackend`] and [`MemoryBackend`] implementations.
//! - [`SealedVault`]: implements [`lethe_core::VaultStore`] over any backend,
//!   adding the host-keyed outer encryption layer.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lethe_crypto::SystemHostFacts;
//! use lethe_store::{FsVault, StoreConfig};
//!
//! let vault = FsVault::open(&StoreConfig::from_env(), Arc::new(SystemHostFacts)).await?;
//! let photos = vault.list_by_kind(MediaKind::Photo).await?;
//! ```

pub mod backend;
pub mod config;
pub mod fs;
pub mod memory;
pub mod vault;

pub use backend::PartitionBackend;
pub use config::StoreConfig;
pub use fs::FilesystemBackend;
pub use memory::MemoryBackend;
pub use vault::{FsVault, MemoryVault, SealedVault};
