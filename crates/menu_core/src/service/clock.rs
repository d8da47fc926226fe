//! Wall-clock source for catalog timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of Unix epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_epoch_ms(&self) -> i64;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Returns the timestamp for the next write: `now`, or `previous + 1` when the
/// clock has not moved past `previous`.
///
/// Returns `None` when `previous` leaves no strictly greater value.
pub fn next_timestamp(previous: Option<i64>, now_epoch_ms: i64) -> Option<i64> {
    match previous {
        Some(previous) if now_epoch_ms <= previous => previous.checked_add(1),
        _ => Some(now_epoch_ms),
    }
}
