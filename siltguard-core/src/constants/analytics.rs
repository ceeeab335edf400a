//! Analytics Parameters
//!
//! Defaults and limits for the window, statistics and accumulation stages.

// ===== WINDOW =====

/// Default number of readings held in the window.
pub const DEFAULT_WINDOW_CAPACITY: usize = 100;

/// Smallest usable window; two readings are needed for a finite difference.
pub const MIN_WINDOW_CAPACITY: usize = 2;

// ===== TREND =====

/// Default number of trailing readings fed to trend classification (K).
pub const DEFAULT_TREND_LOOKBACK: usize = 10;

/// Upper bound on K. The trend tail is copied into a fixed-size buffer.
pub const MAX_TREND_LOOKBACK: usize = 64;

/// Second-half mean must exceed the first-half mean by this factor to count as rising.
pub const TREND_RISING_FACTOR: f32 = 1.1;

/// Second-half mean must drop below the first-half mean by this factor to count as falling.
pub const TREND_FALLING_FACTOR: f32 = 0.9;

// ===== ACCUMULATION =====

/// Default number of trailing reading pairs used for the rate (N).
pub const DEFAULT_ACCUMULATION_LOOKBACK: usize = 6;

/// Upper bound on N. Pair rates are collected in a fixed-size buffer.
pub const MAX_ACCUMULATION_LOOKBACK: usize = 64;

/// Stability index when the rate is zero.
pub const STABILITY_MAX: f32 = 100.0;

// ===== PUBLISHING =====

/// Decimal places kept on the published running average.
pub const AVERAGE_PUBLISH_DECIMALS: u32 = 2;

/// Decimal places kept on the days-to-clog projection.
pub const DAYS_TO_CLOG_DECIMALS: u32 = 1;
