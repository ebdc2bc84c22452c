//! Centralized default constants for the lethe vault.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers, and `from_env()` constructors fall back to them.

// =============================================================================
// DECAY
// =============================================================================

/// Age (minutes) up to which access probability stays at 1.0.
pub const DECAY_FULL_PROBABILITY_MINUTES: f64 = 35.0;

/// Age (minutes) at which access probability reaches 0.0 and media expires.
pub const DECAY_ZERO_PROBABILITY_MINUTES: f64 = 90.0;

// =============================================================================
// STORAGE
// =============================================================================

/// Sequential SHA-256 rounds applied to host facts for the outer key.
///
/// Must match between the process that wrote a store and the one reading it.
pub const HOST_KEY_ITERATIONS: u32 = 12;

/// Default root directory for the filesystem vault.
pub const STORE_PATH: &str = "./lethe-vault";

/// File extension for sealed records inside a partition directory.
pub const RECORD_EXTENSION: &str = "media";

/// Maximum byte length of a media id.
///
/// Ids double as file names: `{id}.media` must fit in a 255-byte name.
pub const MEDIA_ID_MAX_LENGTH: usize = 255 - 1 - RECORD_EXTENSION.len();

// =============================================================================
// CLEANUP SCHEDULER
// =============================================================================

/// Seconds between periodic cleanup passes.
pub const CLEANUP_INTERVAL_SECS: u64 = 300;

/// Capacity of the scheduler event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 64;

// =============================================================================
// REQUESTS
// =============================================================================

/// Number of recent response summaries retained for status lookups.
pub const REQUEST_LOG_CAPACITY: usize = 256;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Env var overriding [`DECAY_FULL_PROBABILITY_MINUTES`].
pub const ENV_DECAY_FULL_MINUTES: &str = "LETHE_DECAY_FULL_MINUTES";

/// Env var overriding [`DECAY_ZERO_PROBABILITY_MINUTES`].
pub const ENV_DECAY_ZERO_MINUTES: &str = "LETHE_DECAY_ZERO_MINUTES";

/// Env var overriding [`STORE_PATH`].
pub const ENV_STORE_PATH: &str = "LETHE_STORE_PATH";

/// Env var overriding [`HOST_KEY_ITERATIONS`].
pub const ENV_HOST_KEY_ITERATIONS: &str = "LETHE_HOST_KEY_ITERATIONS";

/// Env var enabling/disabling the cleanup scheduler.
pub const ENV_CLEANUP_ENABLED: &str = "LETHE_CLEANUP_ENABLED";

/// Env var overriding [`CLEANUP_INTERVAL_SECS`].
pub const ENV_CLEANUP_INTERVAL_SECS: &str = "LETHE_CLEANUP_INTERVAL_SECS";
