//! Rolling Statistics Over the Window
//!
//! ## Overview
//!
//! Tracks `latest`, `average`, `highest` and a three-way trend. Two update
//! paths exist:
//!
//! - **Full compute** after a window replace: everything is derived from the
//!   window contents.
//! - **Incremental** after an append: the running average and maximum are
//!   folded forward one reading at a time, and only the trend is recomputed
//!   from the raw window tail.
//!
//! ## Running average
//!
//! For each appended value the average moves by
//!
//! ```text
//! avg' = (avg * n + value) / (n + 1)
//! ```
//!
//! where `n` is the window length before that reading was pushed. Once the
//! window is full `n` stays at capacity, so the average keeps a fixed weight
//! per new reading. The average is carried unrounded; rounding happens only
//! when a snapshot is published.
//!
//! ## Trend
//!
//! The last K values are split into a first half (`ceil(n/2)` values) and the
//! remainder. The second-half mean is compared against the first-half mean
//! scaled by 1.1 (rising) and 0.9 (falling).

use heapless::Vec as FixedVec;

use crate::constants::{MAX_TREND_LOOKBACK, TREND_FALLING_FACTOR, TREND_RISING_FACTOR};
use crate::reading::Reading;
use crate::window::WindowBuffer;

/// Direction of recent readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Trend {
    /// Second half mean above the first by more than 10%
    Rising,
    /// Second half mean below the first by more than 10%
    Falling,
    /// Neither
    #[default]
    Stable,
}

impl Trend {
    /// Lowercase name for logs and presentation
    pub const fn name(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Stable => "stable",
        }
    }
}

/// Classify a short ascending series of values
pub fn classify_trend(values: &[f32]) -> Trend {
    let n = values.len();
    if n < 2 {
        return Trend::Stable;
    }

    let split = n.div_ceil(2);
    let (first, second) = values.split_at(split);
    let first_mean = mean(first);
    let second_mean = mean(second);

    if second_mean > first_mean * TREND_RISING_FACTOR {
        Trend::Rising
    } else if second_mean < first_mean * TREND_FALLING_FACTOR {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Published statistics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsSnapshot {
    /// Newest value
    pub latest: f32,
    /// Mean of the window
    pub average: f32,
    /// Largest value seen
    pub highest: f32,
    /// Direction over the last K values
    pub trend: Trend,
}

/// Statistics state carried between updates
#[derive(Debug, Clone)]
pub struct StatisticsEngine {
    trend_lookback: usize,
    /// Window length the running average currently represents
    samples: usize,
    average: f32,
    highest: f32,
    latest: f32,
    trend: Trend,
}

impl StatisticsEngine {
    /// `trend_lookback` is clamped to [`MAX_TREND_LOOKBACK`]
    pub fn new(trend_lookback: usize) -> Self {
        Self {
            trend_lookback: trend_lookback.clamp(1, MAX_TREND_LOOKBACK),
            samples: 0,
            average: 0.0,
            highest: 0.0,
            latest: 0.0,
            trend: Trend::Stable,
        }
    }

    /// Recompute everything from the window
    pub fn recompute(&mut self, window: &WindowBuffer) {
        let count = window.len();
        if count == 0 {
            *self = Self::new(self.trend_lookback);
            return;
        }

        let sum: f32 = window.values().sum();
        self.samples = count;
        self.average = sum / count as f32;
        self.highest = window.values().fold(f32::NEG_INFINITY, f32::max);
        self.latest = window.latest().map(|r| r.value).unwrap_or_default();
        self.trend = self.tail_trend(window);
    }

    /// Fold appended readings into the running values
    ///
    /// `window` must already contain `appended`. Its capacity bounds the weight
    /// of the running average.
    pub fn apply_appended(&mut self, appended: &[Reading], window: &WindowBuffer) {
        if appended.is_empty() {
            return;
        }
        if self.samples == 0 {
            self.highest = f32::NEG_INFINITY;
        }

        let capacity = window.capacity();
        for reading in appended {
            let n = self.samples as f32;
            self.average = (self.average * n + reading.value) / (n + 1.0);
            self.highest = self.highest.max(reading.value);
            self.samples = (self.samples + 1).min(capacity);
        }

        if let Some(last) = appended.last() {
            self.latest = last.value;
        }
        self.trend = self.tail_trend(window);
    }

    /// Unrounded statistics
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            latest: self.latest,
            average: self.average,
            highest: self.highest,
            trend: self.trend,
        }
    }

    /// Current trend
    pub fn trend(&self) -> Trend {
        self.trend
    }

    fn tail_trend(&self, window: &WindowBuffer) -> Trend {
        let take = window.len().min(self.trend_lookback);
        let mut tail: FixedVec<f32, MAX_TREND_LOOKBACK> = FixedVec::new();
        for value in window.values().skip(window.len() - take) {
            // Capacity checked by the clamp in `new`
            let _ = tail.push(value);
        }
        classify_trend(&tail)
    }
}
