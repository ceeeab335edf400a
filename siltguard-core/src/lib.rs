//! Core analytics engine for SiltGuard
//!
//! Maintains a bounded window of turbidity readings and derives everything a
//! monitoring dashboard shows from it: rolling statistics, trend, an
//! accumulation-rate projection, a band histogram and an alert level with risk guidance.
//!
//! Key constraints:
//! - No I/O and no async; the ingestion layer does the fetching
//! - Single writer: only [`EngineState`] mutates the window
//! - Malformed readings never reach the statistics
//!
//! ```no_run
//! use siltguard_core::{EngineConfig, EngineState, Reading};
//!
//! let config = EngineConfig::builder().window_capacity(200).build()?;
//! let mut engine = EngineState::new(config);
//!
//! let batch = [Reading::new(1, 120.0, 0), Reading::new(2, 180.0, 3_600_000)];
//! engine.apply_full(&batch, engine.cursor(), 3_600_000)?;
//!
//! let snapshot = engine.snapshot();
//! println!("{:?} at {} NTU", snapshot.alert, snapshot.stats.latest);
//! # Ok::<(), siltguard_core::EngineError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

// Optional logging; compiles away without the `log` dependency
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

pub mod accumulation;
pub mod alert;
pub mod config;
pub mod constants;
pub mod distribution;
pub mod engine;
pub mod errors;
pub mod guard;
pub mod math;
pub mod reading;
pub mod snapshot;
pub mod stats;
pub mod time;
pub mod window;

// Public API
pub use accumulation::{AccumulationAnalyzer, AccumulationMetrics};
pub use alert::{AlertClassifier, AlertLevel, AlertTransition, RiskAssessment};
pub use config::{EngineConfig, ThresholdConfig, ValueTransform};
pub use distribution::DistributionBins;
pub use engine::{ApplyOutcome, EngineState};
pub use errors::{EngineError, EngineResult};
pub use guard::{GuardReport, ReadingGuard};
pub use reading::Reading;
pub use snapshot::{Snapshot, SyncStatus};
pub use stats::{StatisticsEngine, StatsSnapshot, Trend};
pub use time::{FixedTime, TimeSource, Timestamp};
pub use window::WindowBuffer;

#[cfg(feature = "std")]
pub use time::SystemTime;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
