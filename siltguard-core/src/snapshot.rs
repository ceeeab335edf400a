//! Published read-only view of the engine
//!
//! A `Snapshot` is rebuilt after every successful update (and after a failed
//! one, with only `status` changed) and handed to presentation as an immutable
//! value. Nothing in it aliases engine state.

use alloc::string::String;
use alloc::vec::Vec;

use crate::accumulation::AccumulationMetrics;
use crate::alert::{AlertLevel, RiskAssessment};
use crate::distribution::DistributionBins;
use crate::guard::GuardReport;
use crate::reading::Reading;
use crate::stats::StatsSnapshot;
use crate::time::Timestamp;

/// Health of the most recent sync attempt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "state", content = "message", rename_all = "snake_case"))]
pub enum SyncStatus {
    /// Nothing fetched yet
    #[default]
    Idle,
    /// Last sync applied or found nothing new
    Ready,
    /// Full refresh returned no usable rows; previous data retained
    NoDataForRange,
    /// Last sync failed; data is stale
    Error(String),
}

impl SyncStatus {
    /// True when the last sync failed
    pub fn is_error(&self) -> bool {
        matches!(self, SyncStatus::Error(_))
    }
}

/// Everything presentation needs, by value
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Snapshot {
    /// Window contents, ascending by id
    pub readings: Vec<Reading>,
    /// Statistics with the average rounded for display
    pub stats: StatsSnapshot,
    /// Rate, projection and stability
    pub accumulation: AccumulationMetrics,
    /// Counts per threshold band
    pub distribution: DistributionBins,
    /// Current alert level
    pub alert: AlertLevel,
    /// Guidance for `alert`
    pub risk: RiskAssessment,
    /// Clock time of the last applied update
    pub last_update_time: Option<Timestamp>,
    /// Highest id merged so far (0 before the first merge)
    pub cursor: u64,
    /// Outcome of the last sync attempt
    pub status: SyncStatus,
    /// Screening counts of the last applied batch
    pub guard: GuardReport,
}

impl Snapshot {
    /// Newest reading, if any
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last()
    }

    /// True once any data has been merged
    pub fn has_data(&self) -> bool {
        !self.readings.is_empty()
    }
}
