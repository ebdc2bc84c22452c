//! Core traits for lethe abstractions.
//!
//! These traits define the capabilities the vault consumes (time, randomness,
//! storage), enabling pluggable backends and deterministic tests.

use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::error::Result;
use crate::models::{MediaKind, MediaRecord};

// =============================================================================
// VAULT STORE
// =============================================================================

/// Persistence for media records, partitioned by [`MediaKind`].
///
/// Implementations apply the outer encryption layer transparently: callers
/// only ever see whole, verified records.
#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Insert or overwrite a record under its kind partition.
    ///
    /// The write is atomic from a reader's point of view.
    async fn save(&self, record: &MediaRecord) -> Result<()>;

    /// Load a record, scanning every partition.
    ///
    /// Returns `Error::MediaNotFound` when absent and `Error::OuterDecrypt`
    /// when the stored bytes cannot be opened with this host's key.
    async fn load(&self, id: &str) -> Result<MediaRecord>;

    /// Load a record from a known partition only.
    async fn load_kind(&self, id: &str, kind: MediaKind) -> Result<MediaRecord>;

    /// Remove a record. Returns `false` if nothing was stored under `id`.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Check whether a record exists in any partition.
    async fn exists(&self, id: &str) -> Result<bool>;

    /// All stored ids.
    async fn list_all(&self) -> Result<BTreeSet<String>>;

    /// Ids in one partition, listed without decrypting any record.
    async fn list_by_kind(&self, kind: MediaKind) -> Result<BTreeSet<String>>;
}

// =============================================================================
// CLOCK
// =============================================================================

/// Source of current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually controlled clock for tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// =============================================================================
// ADMISSION DRAW
// =============================================================================

/// Uniform sample source for the probabilistic decay gate.
///
/// Need not be cryptographically secure. Each call must produce a fresh
/// sample in `[0, 1)`.
pub trait AdmissionDraw: Send + Sync {
    fn sample(&self) -> f64;
}

/// Thread-local RNG draw (default).
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngDraw;

impl AdmissionDraw for ThreadRngDraw {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Constant draw for forcing admit/deny outcomes in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedDraw(f64);

impl FixedDraw {
    /// Values are clamped into `[0, 1)`.
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0 - f64::EPSILON))
    }

    /// A draw that admits whenever probability is above zero.
    pub fn always_admit() -> Self {
        Self::new(0.0)
    }

    /// A draw that denies whenever probability is below one.
    pub fn always_deny() -> Self {
        Self::new(1.0)
    }
}

impl AdmissionDraw for FixedDraw {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// Scripted draws, replayed in order and then cycled.
#[derive(Debug)]
pub struct SequenceDraw {
    values: Mutex<VecDeque<f64>>,
}

impl SequenceDraw {
    /// Values are clamped into `[0, 1)`. An empty script always samples 0.0.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: Mutex::new(
                values
                    .into_iter()
                    .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
                    .collect(),
            ),
        }
    }
}

impl AdmissionDraw for SequenceDraw {
    fn sample(&self) -> f64 {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        match values.pop_front() {
            Some(v) => {
                values.push_back(v);
                v
            }
            None => 0.0,
        }
    }
}
