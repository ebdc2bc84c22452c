//! # lethe-lifecycle
//!
//! Lifecycle orchestration for the lethe media vault.
//!
//! This crate provides:
//! - [`LifecycleManager`]: decay status, probabilistic admission, access
//!   timestamps, the write path, and expiry cleanup
//! - [`CleanupScheduler`]: a background loop running cleanup on an interval,
//!   with broadcast events and an optional per-pass observer
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lethe_lifecycle::{CleanupScheduler, LifecycleManager, SchedulerConfig};
//!
//! let manager = Arc::new(LifecycleManager::new(vault));
//! let scheduler = CleanupScheduler::new(manager.clone(), SchedulerConfig::from_env());
//!
//! scheduler.start();
//! let mut events = scheduler.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! scheduler.stop().await;
//! ```

pub mod manager;
pub mod scheduler;

pub use manager::{LifecycleManager, LifecycleManagerBuilder};
pub use scheduler::{CleanupObserver, CleanupScheduler, SchedulerConfig, SchedulerEvent};
