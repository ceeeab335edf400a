//! Error Types for Window and Configuration Failures
//!
//! ## Design Philosophy
//!
//! The core never talks to a network or a disk, so every error it can raise is
//! about data shape or configuration:
//!
//! 1. **Small Size**: Variants carry only ids, floats and `&'static str`
//!    reasons, so the enum stays `Copy` and cheap to return from hot paths.
//!
//! 2. **No Heap Allocation**: Messages are static. The ingest layer wraps these
//!    into its own owned error type when it needs context.
//!
//! 3. **Actionable Information**: An `InvariantViolation` names both the
//!    offending id and the window maximum it collided with, which is enough to
//!    tell a duplicate delivery from an out-of-order one.
//!
//! ## Error Categories
//!
//! ### Window Violations
//! - `InvariantViolation`: An appended batch would break ascending id order
//!
//! ### Malformed Readings
//! - `InvalidValue`: NaN or infinity
//! - `NonMonotonic`: id or timestamp went backwards
//!
//! ### Configuration
//! - `InvalidThresholds`: Bounds are not strictly increasing
//! - `InvalidConfig`: Capacity, lookback or interval out of range
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use siltguard_core::{EngineError, ThresholdConfig};
//!
//! match ThresholdConfig::new(100.0, 500.0, 400.0, 1500.0) {
//!     Ok(_) => unreachable!(),
//!     Err(EngineError::InvalidThresholds { .. }) => {
//!         // Refuse to start with a broken alert ladder
//!     }
//!     Err(_) => {}
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors - kept small and `Copy`
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum EngineError {
    /// Appended reading does not advance past the newest id in the window
    #[error("Reading id {incoming_id} does not advance past window maximum {max_id}")]
    InvariantViolation {
        /// Smallest id of the rejected batch
        incoming_id: u64,
        /// Largest id currently held by the window
        max_id: u64,
    },

    /// Thresholds must satisfy normal < warning < danger < critical
    #[error("Thresholds not strictly increasing: {normal} / {warning} / {danger} / {critical}")]
    InvalidThresholds {
        /// Normal bound as given
        normal: f32,
        /// Warning bound as given
        warning: f32,
        /// Danger bound as given
        danger: f32,
        /// Critical bound as given
        critical: f32,
    },

    /// Configuration value out of its accepted range
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Which rule failed
        reason: &'static str,
    },

    /// Value makes no numeric sense (NaN, infinity)
    #[error("Invalid value: not a finite number")]
    InvalidValue,

    /// Reading id or timestamp does not follow the reading before it
    #[error("Reading {id} out of order after {previous_id}")]
    NonMonotonic {
        /// Id of the rejected reading
        id: u64,
        /// Id of the last accepted reading
        previous_id: u64,
    },
}
