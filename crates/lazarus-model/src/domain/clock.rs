use std::time::{SystemTime, UNIX_EPOCH};

/// Unix timestamp in milliseconds.
///
/// Used for the fire time of deferred tasks and heartbeat stamps.
pub type UnixMs = u64;

/// Wall-clock time as [`UnixMs`]. A clock set before the epoch reads as 0.
pub fn unix_ms() -> UnixMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as UnixMs)
        .unwrap_or(0)
}
