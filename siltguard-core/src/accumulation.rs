//! Accumulation Rate and Time-to-Clog Projection
//!
//! ## Overview
//!
//! Sediment build-up is estimated from the slope of recent readings. The
//! analyzer looks at the last N consecutive pairs of the window (N defaults to
//! 6 and never exceeds `len - 1`) and averages their finite-difference rates:
//!
//! ```text
//! pair_rate = (value[i] - value[i-1]) / hours(time[i] - time[i-1])
//! rate      = mean(pair_rate over usable pairs)       NTU per hour
//! ```
//!
//! Pairs whose time span is zero or negative are skipped. If no pair is
//! usable the rate is 0.
//!
//! ## Projection
//!
//! Only a positive rate projects a clog date:
//!
//! ```text
//! remaining     = critical - current
//! days_to_clog  = remaining > 0 ? remaining / rate / 24 : 0     (1 decimal)
//! ```
//!
//! A flat or falling series has no projection at all.
//!
//! ## Stability index
//!
//! `100 - clamp(|rate| / critical * 100, 0, 100)`, rounded. 100 means no
//! measurable change; 0 means the value moves by a full critical-threshold
//! magnitude every hour.

use heapless::Vec as FixedVec;

use crate::constants::{
    DAYS_TO_CLOG_DECIMALS, HOURS_PER_DAY, MAX_ACCUMULATION_LOOKBACK, STABILITY_MAX,
};
use crate::math::{abs, round_to};
use crate::reading::Reading;
use crate::time::hours_between;
use crate::window::WindowBuffer;

/// Output of one analysis pass
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccumulationMetrics {
    /// Mean slope in NTU per hour (signed)
    pub rate: f32,
    /// Days until the critical threshold, only when rising
    pub days_to_clog: Option<f32>,
    /// 0-100, higher is calmer
    pub stability_index: u8,
}

impl AccumulationMetrics {
    /// Projection label for presentation
    pub fn projection_label(&self) -> &'static str {
        match self.days_to_clog {
            Some(days) if days <= 0.0 => "clogged",
            Some(_) => "rising",
            None => "stable",
        }
    }
}

/// Finite-difference rate analyzer
#[derive(Debug, Clone, Copy)]
pub struct AccumulationAnalyzer {
    lookback: usize,
    critical: f32,
}

impl AccumulationAnalyzer {
    /// `lookback` is clamped to [`MAX_ACCUMULATION_LOOKBACK`]
    pub fn new(lookback: usize, critical: f32) -> Self {
        Self {
            lookback: lookback.clamp(1, MAX_ACCUMULATION_LOOKBACK),
            critical,
        }
    }

    /// Analyze the current window
    pub fn analyze(&self, window: &WindowBuffer) -> AccumulationMetrics {
        let rate = self.rate(window);
        let current = window.latest().map(|r| r.value).unwrap_or_default();

        AccumulationMetrics {
            rate,
            days_to_clog: self.project(rate, current),
            stability_index: self.stability(rate),
        }
    }

    /// Mean rate over the last usable pairs
    pub fn rate(&self, window: &WindowBuffer) -> f32 {
        let pairs = self.lookback.min(window.len().saturating_sub(1));
        if pairs == 0 {
            return 0.0;
        }

        // pairs + 1 trailing readings give exactly `pairs` consecutive pairs
        let start = window.len() - (pairs + 1);
        let mut rates: FixedVec<f32, MAX_ACCUMULATION_LOOKBACK> = FixedVec::new();
        let mut previous: Option<&Reading> = None;

        for reading in window.iter().skip(start) {
            if let Some(prev) = previous {
                let span = hours_between(prev.timestamp, reading.timestamp);
                if span > 0.0 {
                    let _ = rates.push((reading.value - prev.value) / span);
                }
            }
            previous = Some(reading);
        }

        if rates.is_empty() {
            return 0.0;
        }
        rates.iter().sum::<f32>() / rates.len() as f32
    }

    fn project(&self, rate: f32, current: f32) -> Option<f32> {
        if rate <= 0.0 {
            return None;
        }

        let remaining = self.critical - current;
        let days = if remaining > 0.0 {
            round_to(remaining / rate / HOURS_PER_DAY, DAYS_TO_CLOG_DECIMALS)
        } else {
            0.0
        };
        Some(days)
    }

    fn stability(&self, rate: f32) -> u8 {
        let swing = (abs(rate) / self.critical * 100.0).clamp(0.0, STABILITY_MAX);
        round_to(STABILITY_MAX - swing, 0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MS_PER_HOUR;
    use alloc::vec::Vec;

    const CRITICAL: f32 = 1500.0;

    fn window_at_hours(points: &[(u64, f32)]) -> WindowBuffer {
        let readings: Vec<Reading> = points
            .iter()
            .enumerate()
            .map(|(i, (h, v))| Reading::new(i as u64 + 1, *v, h * MS_PER_HOUR))
            .collect();
        let mut window = WindowBuffer::new(100);
        window.replace(&readings).unwrap();
        window
    }

    #[test]
    fn single_pair_projection() {
        let window = window_at_hours(&[(0, 100.0), (1, 200.0)]);
        let metrics = AccumulationAnalyzer::new(6, CRITICAL).analyze(&window);

        assert_eq!(metrics.rate, 100.0);
        assert_eq!(metrics.days_to_clog, Some(0.5));
        assert_eq!(metrics.stability_index, 93);
        assert_eq!(metrics.projection_label(), "rising");
    }

    #[test]
    fn falling_series_has_no_projection() {
        let window = window_at_hours(&[(0, 300.0), (1, 200.0), (2, 100.0)]);
        let metrics = AccumulationAnalyzer::new(6, CRITICAL).analyze(&window);

        assert_eq!(metrics.rate, -100.0);
        assert_eq!(metrics.days_to_clog, None);
        assert_eq!(metrics.projection_label(), "stable");
    }

    #[test]
    fn already_past_critical_projects_zero() {
        let window = window_at_hours(&[(0, 1500.0), (1, 1600.0)]);
        let metrics = AccumulationAnalyzer::new(6, CRITICAL).analyze(&window);
        assert_eq!(metrics.days_to_clog, Some(0.0));
        assert_eq!(metrics.projection_label(), "clogged");
    }

    #[test]
    fn zero_span_pairs_are_skipped() {
        // Middle pair shares a timestamp
        let window = window_at_hours(&[(0, 100.0), (1, 200.0), (1, 900.0), (2, 1000.0)]);
        let rate = AccumulationAnalyzer::new(6, CRITICAL).rate(&window);
        assert_eq!(rate, 100.0);
    }

    #[test]
    fn only_last_n_pairs_count() {
        // Early spike is outside a lookback of 2 pairs
        let window = window_at_hours(&[(0, 0.0), (1, 1000.0), (2, 1000.0), (3, 1010.0), (4, 1020.0)]);
        let rate = AccumulationAnalyzer::new(2, CRITICAL).rate(&window);
        assert_eq!(rate, 10.0);
    }

    #[test]
    fn empty_and_single_reading_windows_are_flat() {
        let analyzer = AccumulationAnalyzer::new(6, CRITICAL);
        let empty = WindowBuffer::new(10);
        let metrics = analyzer.analyze(&empty);
        assert_eq!(metrics.rate, 0.0);
        assert_eq!(metrics.stability_index, 100);
        assert_eq!(metrics.days_to_clog, None);

        let single = window_at_hours(&[(0, 500.0)]);
        assert_eq!(analyzer.rate(&single), 0.0);
    }

    #[test]
    fn stability_floors_at_zero() {
        let window = window_at_hours(&[(0, 0.0), (1, 3000.0)]);
        let metrics = AccumulationAnalyzer::new(6, CRITICAL).analyze(&window);
        assert_eq!(metrics.stability_index, 0);
    }
}
