//! # lethe-core
//!
//! Core types, traits, and the decay model for the lethe media vault.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the crypto, store, lifecycle, and request crates depend on. It has no
//! I/O of its own.

pub mod decay;
pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use decay::DecayConfig;
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{new_v7, new_v7_at};
