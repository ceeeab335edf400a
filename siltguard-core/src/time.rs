//! Time handling for the analytics engine
//!
//! Readings carry store timestamps; the engine itself only needs a clock to
//! stamp `last_update_time` on published snapshots. Sources:
//! - System clock (when `std` is available)
//! - Fixed/steppable clock (tests, replay)

use core::sync::atomic::{AtomicU64, Ordering};

use crate::constants::MS_PER_HOUR;

/// Timestamp in milliseconds since epoch
pub type Timestamp = u64;

/// Source of time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Check if this source provides wall clock time (vs synthetic)
    fn is_wall_clock(&self) -> bool;
}

/// System time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct SystemTime;

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Fixed time source for testing
///
/// Uses an atomic so a shared reference can still be stepped forward while
/// the controller holds it.
#[derive(Debug)]
pub struct FixedTime {
    timestamp: AtomicU64,
}

impl FixedTime {
    /// Clock frozen at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp: AtomicU64::new(timestamp),
        }
    }

    /// Jump to `timestamp`
    pub fn set(&self, timestamp: Timestamp) {
        self.timestamp.store(timestamp, Ordering::Relaxed);
    }

    /// Move forward by `ms` milliseconds
    pub fn advance(&self, ms: u64) {
        self.timestamp.fetch_add(ms, Ordering::Relaxed);
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp.load(Ordering::Relaxed)
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// A shared clock; tests keep one handle and move it from outside
#[cfg(target_has_atomic = "ptr")]
impl<T: TimeSource + ?Sized> TimeSource for alloc::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }
}

/// Signed distance between two timestamps in hours
///
/// Negative when `later` is actually earlier; callers decide what to do with
/// non-positive spans.
pub fn hours_between(earlier: Timestamp, later: Timestamp) -> f32 {
    if later >= earlier {
        (later - earlier) as f32 / MS_PER_HOUR as f32
    } else {
        -((earlier - later) as f32 / MS_PER_HOUR as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_steps() {
        let clock = FixedTime::new(1_000);
        clock.advance(500);
        assert_eq!(clock.now(), 1_500);
        clock.set(10);
        assert_eq!(clock.now(), 10);
        assert!(!clock.is_wall_clock());
    }

    #[test]
    fn hours_between_is_signed() {
        assert_eq!(hours_between(0, MS_PER_HOUR), 1.0);
        assert_eq!(hours_between(MS_PER_HOUR, 0), -1.0);
        assert_eq!(hours_between(5, 5), 0.0);
    }
}
