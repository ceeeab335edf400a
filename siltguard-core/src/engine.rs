//! Engine-Owned Analytics State
//!
//! ## Overview
//!
//! `EngineState` is the single owner of the window, the cursor and every
//! analytics stage. The async ingestion layer fetches rows, then hands them
//! here; everything in this module is synchronous and never suspends, so a
//! caller can hold a lock around an `apply_*` call without holding it across a
//! fetch.
//!
//! ## Update paths
//!
//! ```text
//! apply_full         guard -> window.replace -> stats.recompute  -+
//!                                                                  +-> accumulation
//! apply_incremental  guard -> window.append  -> stats.fold       -+    distribution
//!                                                                       alert
//! ```
//!
//! ## Staleness
//!
//! Every apply is checked against the cursor at apply-time:
//!
//! - An incremental batch whose highest id does not advance the cursor is
//!   discarded as stale.
//! - A full batch is discarded when the cursor moved since the fetch was
//!   issued and the batch does not carry it further. A full refresh of an
//!   older range against an unchanged cursor still applies, because range
//!   changes are legitimate.
//!
//! The cursor never moves backwards; a full refresh of an older range leaves
//! it where it was, and [`EngineState::is_historical`] reports the gap.
//!
//! A full batch that screens to exactly the current window is reported as
//! `Unchanged`: nothing is recomputed and `last_update_time` keeps its value,
//! so repeating a refresh against an unchanged store publishes nothing new.

use alloc::string::String;

use crate::accumulation::{AccumulationAnalyzer, AccumulationMetrics};
use crate::alert::{AlertClassifier, AlertEvaluation, AlertTransition};
use crate::config::EngineConfig;
use crate::constants::AVERAGE_PUBLISH_DECIMALS;
use crate::distribution::DistributionBins;
use crate::errors::EngineResult;
use crate::guard::{GuardReport, ReadingGuard};
use crate::math::round_to;
use crate::reading::Reading;
use crate::snapshot::{Snapshot, SyncStatus};
use crate::stats::StatisticsEngine;
use crate::time::Timestamp;
use crate::window::WindowBuffer;

/// What an apply call did with its batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Batch merged; analytics and snapshot updated
    Applied {
        /// Readings that passed the guard
        rows: usize,
        /// Alert change caused by this batch
        transition: Option<AlertTransition>,
    },
    /// Full refresh produced no usable rows; prior window retained
    Empty,
    /// Nothing new: an incremental batch with nothing usable, or a full
    /// refresh that returned exactly the current window
    Unchanged,
    /// Batch did not advance the cursor and was discarded
    Stale,
}

/// Single-writer engine state
#[derive(Debug, Clone)]
pub struct EngineState {
    config: EngineConfig,
    guard: ReadingGuard,
    window: WindowBuffer,
    cursor: u64,
    stats: StatisticsEngine,
    accumulation: AccumulationAnalyzer,
    classifier: AlertClassifier,
    metrics: AccumulationMetrics,
    distribution: DistributionBins,
    evaluation: AlertEvaluation,
    guard_report: GuardReport,
    status: SyncStatus,
    last_update_time: Option<Timestamp>,
}

impl EngineState {
    /// Build an empty engine from an already validated configuration
    pub fn new(config: EngineConfig) -> Self {
        let window = WindowBuffer::new(config.window_capacity());
        let stats = StatisticsEngine::new(config.trend_lookback());
        let accumulation =
            AccumulationAnalyzer::new(config.accumulation_lookback(), config.thresholds().critical());
        let mut classifier = AlertClassifier::new(*config.thresholds());
        let evaluation = classifier.evaluate(&stats.snapshot());

        Self {
            guard: ReadingGuard::new(config.value_transform()),
            metrics: accumulation.analyze(&window),
            distribution: DistributionBins::default(),
            window,
            cursor: 0,
            stats,
            accumulation,
            classifier,
            evaluation,
            guard_report: GuardReport::default(),
            status: SyncStatus::Idle,
            last_update_time: None,
            config,
        }
    }

    /// Validate `config` and build the engine
    pub fn try_new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Replace the window with an ascending full-refresh batch
    ///
    /// `issued_cursor` is the cursor observed when the fetch was issued.
    pub fn apply_full(
        &mut self,
        batch: &[Reading],
        issued_cursor: u64,
        now: Timestamp,
    ) -> EngineResult<ApplyOutcome> {
        let batch_max = batch.iter().map(|r| r.id).max();

        if self.cursor != issued_cursor && batch_max.map_or(true, |max| max <= self.cursor) {
            log_debug!(
                "Discarding stale full refresh (issued at {}, cursor now {})",
                issued_cursor,
                self.cursor
            );
            return Ok(ApplyOutcome::Stale);
        }

        let (accepted, report) = self.guard.screen(batch.iter().copied());
        let last = match accepted.last() {
            Some(last) => *last,
            None => {
                self.status = SyncStatus::NoDataForRange;
                return Ok(ApplyOutcome::Empty);
            }
        };

        // Same readings as already held: keep the snapshot, only clear status
        let kept = &accepted[accepted.len().saturating_sub(self.window.capacity())..];
        if self.window.holds(kept) {
            self.status = SyncStatus::Ready;
            return Ok(ApplyOutcome::Unchanged);
        }

        self.window.replace(&accepted)?;
        self.cursor = self.cursor.max(last.id);
        self.stats.recompute(&self.window);
        let transition = self.refresh_derived();
        self.mark_applied(report, now);

        Ok(ApplyOutcome::Applied {
            rows: accepted.len(),
            transition,
        })
    }

    /// Append an ascending incremental batch
    ///
    /// The batch is screened against the window's newest reading, so a
    /// reading stamped before it never enters. On an invariant violation the window, cursor and analytics are left
    /// untouched and the error is returned for the caller to surface.
    pub fn apply_incremental(&mut self, batch: &[Reading], now: Timestamp) -> EngineResult<ApplyOutcome> {
        let batch_max = match batch.iter().map(|r| r.id).max() {
            Some(max) => max,
            None => return Ok(ApplyOutcome::Unchanged),
        };
        if batch_max <= self.cursor {
            log_debug!("Discarding stale poll result (max {} <= cursor {})", batch_max, self.cursor);
            return Ok(ApplyOutcome::Stale);
        }

        self.window.check_follows(batch)?;

        let newest = self.window.latest().copied();
        let (accepted, report) = self.guard.screen_after(batch.iter().copied(), newest);
        let last = match accepted.last() {
            Some(last) => *last,
            None => {
                self.guard_report = report;
                return Ok(ApplyOutcome::Unchanged);
            }
        };

        self.window.append(&accepted)?;
        self.cursor = last.id;
        self.stats.apply_appended(&accepted, &self.window);
        let transition = self.refresh_derived();
        self.mark_applied(report, now);

        Ok(ApplyOutcome::Applied {
            rows: accepted.len(),
            transition,
        })
    }

    /// Record a failed sync; data is kept as-is
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.status = SyncStatus::Error(message.into());
    }

    /// Record a sync that found nothing new
    pub fn record_idle_poll(&mut self) {
        if self.status.is_error() || self.status == SyncStatus::Idle {
            self.status = SyncStatus::Ready;
        }
    }

    /// Build the published view
    pub fn snapshot(&self) -> Snapshot {
        let mut stats = self.stats.snapshot();
        stats.average = round_to(stats.average, AVERAGE_PUBLISH_DECIMALS);

        Snapshot {
            readings: self.window.to_vec(),
            stats,
            accumulation: self.metrics,
            distribution: self.distribution,
            alert: self.evaluation.level,
            risk: self.evaluation.risk,
            last_update_time: self.last_update_time,
            cursor: self.cursor,
            status: self.status.clone(),
            guard: self.guard_report,
        }
    }

    /// Highest id merged so far
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Current window contents
    pub fn window(&self) -> &WindowBuffer {
        &self.window
    }

    /// Window ends before the cursor: a past range is loaded, so appending
    /// live readings would leave a gap
    pub fn is_historical(&self) -> bool {
        self.window.max_id().map_or(false, |max| max < self.cursor)
    }

    /// Validated configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Status of the last sync
    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Accumulation, distribution and alert all follow the statistics
    fn refresh_derived(&mut self) -> Option<AlertTransition> {
        self.metrics = self.accumulation.analyze(&self.window);
        self.distribution = DistributionBins::from_values(self.window.values(), self.config.thresholds());
        self.evaluation = self.classifier.evaluate(&self.stats.snapshot());
        self.evaluation.transition
    }

    fn mark_applied(&mut self, report: GuardReport, now: Timestamp) {
        self.guard_report = report;
        self.status = SyncStatus::Ready;
        self.last_update_time = Some(now);
    }
}
