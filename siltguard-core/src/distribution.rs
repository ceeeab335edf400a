//! Value histogram over the threshold bands
//!
//! Four bands: `[0, normal)`, `[normal, warning)`, `[warning, danger)` and
//! `[danger, inf)`. Recomputed from scratch on every update; the window is
//! bounded so a full pass is cheap. Values below zero (possible after an
//! inversion transform) are counted in the lowest band so the bins always sum
//! to the window length.

use crate::config::ThresholdConfig;

/// Reading counts per threshold band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistributionBins {
    /// Below `normal`
    pub normal: usize,
    /// From `normal` up to `warning`
    pub warning: usize,
    /// From `warning` up to `danger`
    pub danger: usize,
    /// At or above `danger`
    pub critical: usize,
}

impl DistributionBins {
    /// Bin every value
    pub fn from_values<I>(values: I, thresholds: &ThresholdConfig) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        let mut bins = Self::default();
        for value in values {
            if value < thresholds.normal() {
                bins.normal += 1;
            } else if value < thresholds.warning() {
                bins.warning += 1;
            } else if value < thresholds.danger() {
                bins.danger += 1;
            } else {
                bins.critical += 1;
            }
        }
        bins
    }

    /// Sum of all bands
    pub fn total(&self) -> usize {
        self.normal + self.warning + self.danger + self.critical
    }
}
