//! Time Constants
//!
//! Unit conversions and scheduling cadence.

/// Milliseconds in one hour.
pub const MS_PER_HOUR: u64 = 3_600_000;

/// Hours in one day, for days-to-clog projection.
pub const HOURS_PER_DAY: f32 = 24.0;

/// Default live polling interval (ms).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;
