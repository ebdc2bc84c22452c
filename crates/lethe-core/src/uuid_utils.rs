//! UUID v7 utilities for time-ordered media and request identifiers.
//!
//! UUIDv7 embeds a millisecond Unix timestamp in its first 48 bits, so ids
//! generated later sort later. Media ids and request ids both use it.

use chrono::{DateTime, Utc};
use uuid::{NoContext, Timestamp, Uuid};

/// Generate a new UUIDv7 identifier from the wall clock.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a UUIDv7 stamped with a specific instant (random low bits).
///
/// Used when time comes from an injected clock rather than the wall clock.
pub fn new_v7_at(ts: &DateTime<Utc>) -> Uuid {
    let secs = ts.timestamp().max(0) as u64;
    let nanos = ts.timestamp_subsec_nanos();
    Uuid::new_v7(Timestamp::from_unix(NoContext, secs, nanos))
}
