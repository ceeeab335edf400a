//! Engine Configuration
//!
//! ## Overview
//!
//! Configuration is validated exactly once, at construction, and is immutable
//! afterwards. An engine can therefore assume that thresholds are strictly
//! increasing and that every lookback fits its fixed-size buffers.
//!
//! ## Example
//!
//! ```rust
//! use siltguard_core::config::{EngineConfig, ThresholdConfig, ValueTransform};
//!
//! let thresholds = ThresholdConfig::new(100.0, 500.0, 1000.0, 1500.0)?;
//! let config = EngineConfig::builder()
//!     .thresholds(thresholds)
//!     .window_capacity(500)
//!     .trend_lookback(12)
//!     .value_transform(ValueTransform::Inverted { sensor_max: 3000.0 })
//!     .build()?;
//!
//! assert_eq!(config.window_capacity(), 500);
//! # Ok::<(), siltguard_core::EngineError>(())
//! ```
//!
//! With the `serde` feature both types deserialize from JSON. A deserialized
//! value has skipped the constructor, so run [`EngineConfig::validate`] before
//! handing it to an engine.

use crate::constants::{
    DEFAULT_ACCUMULATION_LOOKBACK, DEFAULT_CRITICAL_NTU, DEFAULT_DANGER_NTU,
    DEFAULT_NORMAL_NTU, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TREND_LOOKBACK,
    DEFAULT_WARNING_NTU, DEFAULT_WINDOW_CAPACITY, MAX_ACCUMULATION_LOOKBACK,
    MAX_TREND_LOOKBACK, MIN_WINDOW_CAPACITY,
};
use crate::errors::{EngineError, EngineResult};

/// Four strictly increasing alert bounds (NTU)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThresholdConfig {
    normal: f32,
    warning: f32,
    danger: f32,
    critical: f32,
}

impl ThresholdConfig {
    /// Create thresholds, rejecting non-finite or non-increasing bounds
    pub fn new(normal: f32, warning: f32, danger: f32, critical: f32) -> EngineResult<Self> {
        let thresholds = Self { normal, warning, danger, critical };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Re-check ordering (needed after deserialization)
    pub fn validate(&self) -> EngineResult<()> {
        let bounds = [self.normal, self.warning, self.danger, self.critical];
        let finite = bounds.iter().all(|b| b.is_finite());
        let increasing = bounds.windows(2).all(|pair| pair[0] < pair[1]);

        if finite && increasing {
            Ok(())
        } else {
            Err(EngineError::InvalidThresholds {
                normal: self.normal,
                warning: self.warning,
                danger: self.danger,
                critical: self.critical,
            })
        }
    }

    /// Lower bound of the warning band
    pub fn normal(&self) -> f32 {
        self.normal
    }

    /// Lower bound of the danger band
    pub fn warning(&self) -> f32 {
        self.warning
    }

    /// Lower bound of the critical band
    pub fn danger(&self) -> f32 {
        self.danger
    }

    /// Critical bound, also the clogging target
    pub fn critical(&self) -> f32 {
        self.critical
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            normal: DEFAULT_NORMAL_NTU,
            warning: DEFAULT_WARNING_NTU,
            danger: DEFAULT_DANGER_NTU,
            critical: DEFAULT_CRITICAL_NTU,
        }
    }
}

/// Transform applied to every value at ingestion
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ValueTransform {
    /// Store values are used as-is
    #[default]
    Identity,
    /// Sensor reports inverted polarity: `value' = sensor_max - value`
    Inverted {
        /// Full-scale reading of the sensor
        sensor_max: f32,
    },
}

impl ValueTransform {
    /// Map a raw store value to the value the engine analyzes
    #[inline]
    pub fn apply(&self, value: f32) -> f32 {
        match self {
            ValueTransform::Identity => value,
            ValueTransform::Inverted { sensor_max } => sensor_max - value,
        }
    }
}

/// Validated engine configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    window_capacity: usize,
    poll_interval_ms: u64,
    trend_lookback: usize,
    accumulation_lookback: usize,
    thresholds: ThresholdConfig,
    value_transform: ValueTransform,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            trend_lookback: DEFAULT_TREND_LOOKBACK,
            accumulation_lookback: DEFAULT_ACCUMULATION_LOOKBACK,
            thresholds: ThresholdConfig::default(),
            value_transform: ValueTransform::Identity,
        }
    }
}

impl EngineConfig {
    /// Start a builder seeded with defaults
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check every field against its accepted range
    pub fn validate(&self) -> EngineResult<()> {
        self.thresholds.validate()?;

        if self.window_capacity < MIN_WINDOW_CAPACITY {
            return Err(EngineError::InvalidConfig {
                reason: "window capacity must hold at least two readings",
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "poll interval must be positive",
            });
        }
        if self.trend_lookback == 0 || self.trend_lookback > MAX_TREND_LOOKBACK {
            return Err(EngineError::InvalidConfig {
                reason: "trend lookback out of range",
            });
        }
        if self.accumulation_lookback == 0
            || self.accumulation_lookback > MAX_ACCUMULATION_LOOKBACK
            || self.accumulation_lookback > self.window_capacity - 1
        {
            return Err(EngineError::InvalidConfig {
                reason: "accumulation lookback must be within capacity - 1",
            });
        }
        if let ValueTransform::Inverted { sensor_max } = self.value_transform {
            if !sensor_max.is_finite() {
                return Err(EngineError::InvalidConfig {
                    reason: "inversion sensor maximum must be finite",
                });
            }
        }

        Ok(())
    }

    /// Maximum readings held by the window
    pub fn window_capacity(&self) -> usize {
        self.window_capacity
    }

    /// Poll interval in milliseconds
    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    /// Readings considered for the trend (K)
    pub fn trend_lookback(&self) -> usize {
        self.trend_lookback
    }

    /// Reading pairs averaged for the accumulation rate (N)
    pub fn accumulation_lookback(&self) -> usize {
        self.accumulation_lookback
    }

    /// Alert ladder
    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    /// Transform applied at ingestion
    pub fn value_transform(&self) -> ValueTransform {
        self.value_transform
    }
}

/// Consuming builder for [`EngineConfig`]
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the window capacity
    pub fn window_capacity(mut self, capacity: usize) -> Self {
        self.config.window_capacity = capacity;
        self
    }

    /// Set the poll interval in milliseconds
    pub fn poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.config.poll_interval_ms = interval_ms;
        self
    }

    /// Set the trend lookback K
    pub fn trend_lookback(mut self, lookback: usize) -> Self {
        self.config.trend_lookback = lookback;
        self
    }

    /// Set the accumulation lookback N
    pub fn accumulation_lookback(mut self, lookback: usize) -> Self {
        self.config.accumulation_lookback = lookback;
        self
    }

    /// Set the alert ladder
    pub fn thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Set the ingestion value transform
    pub fn value_transform(mut self, transform: ValueTransform) -> Self {
        self.config.value_transform = transform;
        self
    }

    /// Validate and freeze
    pub fn build(self) -> EngineResult<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
