//! Constants for SiltGuard Core
//!
//! Centralized defaults and hard limits used throughout the engine. Every
//! numeric value lives here with its unit, so analytics code never carries a
//! magic number.
//!
//! ## Organization
//!
//! - **Analytics**: Trend factors, lookbacks, window sizing
//! - **Thresholds**: Default NTU alert ladder
//! - **Time**: Unit conversions and polling cadence

/// Trend factors, lookback windows and capacity limits.
pub mod analytics;

/// Default turbidity thresholds in NTU.
pub mod thresholds;

/// Time conversions and scheduling intervals.
pub mod time;

pub use analytics::*;
pub use thresholds::*;
pub use time::*;
