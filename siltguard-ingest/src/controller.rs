//! Ingestion Controller - Full Refresh and Incremental Polling
//!
//! ## Overview
//!
//! The controller is the only writer of the engine state. It drives two
//! operations against a [`ReadingStore`]:
//!
//! - **Full refresh**: fetch up to `capacity` newest rows of a range (newest
//!   first), reverse them, replace the window and recompute every stage.
//! - **Incremental poll**: probe the latest id; if it is ahead of the cursor,
//!   fetch everything after the cursor, append it and update the statistics
//!   incrementally.
//!
//! ## Single In-Flight Discipline
//!
//! At most one operation runs at a time. The check is a compare-and-swap on
//! an `AtomicBool`, released by a drop guard, so a request that loses the
//! race returns [`SyncOutcome::Busy`] immediately instead of queueing.
//!
//! ```text
//! poll ─┬─ try_begin ── probe ── fetch ──▶ lock ─ apply ─ unlock ─▶ publish
//!       └─ (busy) ──▶ SyncOutcome::Busy
//! ```
//!
//! ## Staleness
//!
//! The cursor observed when an operation is issued travels with it; the
//! engine compares it against the cursor at apply-time and discards results
//! that no longer advance it. The lock is never held across an `.await`.
//!
//! ## Publication
//!
//! Snapshots go out through a `tokio::sync::watch` channel as `Arc<Snapshot>`.
//! A failed operation republishes the previous data with an error status.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, info, warn};
use siltguard_core::{
    AlertTransition, ApplyOutcome, EngineConfig, EngineState, Snapshot, TimeSource,
};
use tokio::sync::watch;

use crate::row::coerce_rows;
use crate::{IngestError, RangeSelector, ReadingStore, StoreError, SyncStats};

/// Result of one sync operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Rows merged and a new snapshot published
    Applied { rows: usize },
    /// Full refresh found no usable rows; previous data kept
    Empty,
    /// Nothing new in the store
    Unchanged,
    /// Result arrived after the cursor had moved on; discarded
    Stale,
    /// Another operation was in flight; request dropped
    Busy,
}

/// Releases the in-flight flag when dropped
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owner of the engine state and its sync lifecycle
pub struct IngestionController<S, T> {
    store: S,
    clock: T,
    state: Mutex<EngineState>,
    stats: Mutex<SyncStats>,
    last_range: Mutex<RangeSelector>,
    in_flight: AtomicBool,
    live: AtomicBool,
    publisher: watch::Sender<Arc<Snapshot>>,
    poll_interval: Duration,
}

impl<S, T> IngestionController<S, T>
where
    S: ReadingStore,
    T: TimeSource + Send + Sync,
{
    /// Validate `config` and build a controller in live mode
    ///
    /// Returns the receiver presentation subscribes to; more can be made
    /// with [`subscribe`](Self::subscribe).
    pub fn new(
        store: S,
        config: EngineConfig,
        clock: T,
    ) -> Result<(Self, watch::Receiver<Arc<Snapshot>>), IngestError> {
        let state = EngineState::try_new(config)?;
        let (publisher, receiver) = watch::channel(Arc::new(state.snapshot()));

        let controller = Self {
            store,
            clock,
            state: Mutex::new(state),
            stats: Mutex::new(SyncStats::default()),
            last_range: Mutex::new(RangeSelector::default()),
            in_flight: AtomicBool::new(false),
            live: AtomicBool::new(true),
            publisher,
            poll_interval: Duration::from_millis(config.poll_interval_ms()),
        };
        Ok((controller, receiver))
    }

    /// Load a range from scratch
    pub async fn full_refresh(&self, range: RangeSelector) -> Result<SyncOutcome, IngestError> {
        let Some(_ticket) = self.try_begin() else {
            return Ok(self.busy("full refresh"));
        };

        *lock(&self.last_range) = range;
        let (issued_cursor, capacity) = {
            let state = lock(&self.state);
            (state.cursor(), state.config().window_capacity())
        };
        let query = range.to_query(self.clock.now(), capacity);

        lock(&self.stats).full_refreshes += 1;
        let rows = match self.store.fetch_range(&query).await {
            Ok(rows) => rows,
            Err(e) => return Err(self.fail_store(e)),
        };

        let (mut readings, dropped) = coerce_rows(rows);
        if query.descending {
            readings.reverse();
        }

        let now = self.clock.now();
        let (applied, status_moved, historical) = {
            let mut state = lock(&self.state);
            let before = state.status().clone();
            let applied = state.apply_full(&readings, issued_cursor, now);
            (applied, *state.status() != before, state.is_historical())
        };
        let outcome = self.settle(applied, dropped)?;

        match outcome {
            SyncOutcome::Applied { rows } => info!("Full refresh ({:?}) loaded {} readings", range, rows),
            SyncOutcome::Empty => info!("Full refresh ({:?}) returned no data; keeping previous window", range),
            // same window as before; only a cleared status needs publishing
            SyncOutcome::Unchanged if status_moved => self.publish(),
            _ => {}
        }

        if historical && outcome != SyncOutcome::Stale && self.live.swap(false, Ordering::AcqRel) {
            info!("Full refresh ({:?}) loaded a past range; live polling paused", range);
        }
        Ok(outcome)
    }

    /// Re-run the last full refresh range
    pub async fn manual_refresh(&self) -> Result<SyncOutcome, IngestError> {
        let range = *lock(&self.last_range);
        self.full_refresh(range).await
    }

    /// Merge anything newer than the cursor
    ///
    /// Skipped while the window holds a past range; a full refresh of a
    /// current range resumes appending.
    pub async fn incremental_poll(&self) -> Result<SyncOutcome, IngestError> {
        let Some(_ticket) = self.try_begin() else {
            return Ok(self.busy("incremental poll"));
        };

        let (cursor, historical) = {
            let state = lock(&self.state);
            (state.cursor(), state.is_historical())
        };
        if historical {
            debug!("Skipping poll: window holds a past range ending before cursor {}", cursor);
            return Ok(SyncOutcome::Unchanged);
        }
        lock(&self.stats).polls += 1;

        let latest = match self.store.fetch_latest_id().await {
            Ok(latest) => latest,
            Err(e) => return Err(self.fail_store(e)),
        };
        if latest.map_or(true, |id| id <= cursor) {
            self.settle_idle();
            return Ok(SyncOutcome::Unchanged);
        }

        let rows = match self.store.fetch_since(cursor).await {
            Ok(rows) => rows,
            Err(e) => return Err(self.fail_store(e)),
        };
        let (readings, dropped) = coerce_rows(rows);

        let now = self.clock.now();
        let applied = lock(&self.state).apply_incremental(&readings, now);
        let outcome = self.settle(applied, dropped)?;

        if let SyncOutcome::Applied { rows } = outcome {
            debug!("Poll merged {} readings after cursor {}", rows, cursor);
        }
        Ok(outcome)
    }

    /// Enable or pause live polling; an in-flight fetch still lands
    pub fn set_live(&self, live: bool) {
        let was = self.live.swap(live, Ordering::AcqRel);
        if was != live {
            info!("Live polling {}", if live { "resumed" } else { "paused" });
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.publisher.borrow().clone()
    }

    /// New receiver for published snapshots
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.publisher.subscribe()
    }

    pub fn stats(&self) -> SyncStats {
        lock(&self.stats).clone()
    }

    pub fn cursor(&self) -> u64 {
        lock(&self.state).cursor()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn last_range(&self) -> RangeSelector {
        *lock(&self.last_range)
    }

    fn try_begin(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    fn busy(&self, operation: &str) -> SyncOutcome {
        debug!("Dropping {}: another sync is in flight", operation);
        lock(&self.stats).busy_drops += 1;
        SyncOutcome::Busy
    }

    /// Translate an engine result, publishing when anything changed
    fn settle(
        &self,
        applied: Result<ApplyOutcome, siltguard_core::EngineError>,
        dropped: usize,
    ) -> Result<SyncOutcome, IngestError> {
        lock(&self.stats).rows_rejected += dropped as u64;

        let outcome = match applied {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Batch rejected: {}", e);
                self.record_failure(e.to_string());
                return Err(e.into());
            }
        };

        match outcome {
            ApplyOutcome::Applied { rows, transition } => {
                lock(&self.stats).rows_applied += rows as u64;
                if let Some(transition) = transition {
                    log_transition(transition);
                }
                self.publish();
                Ok(SyncOutcome::Applied { rows })
            }
            ApplyOutcome::Empty => {
                self.publish();
                Ok(SyncOutcome::Empty)
            }
            ApplyOutcome::Unchanged => {
                self.settle_idle();
                Ok(SyncOutcome::Unchanged)
            }
            ApplyOutcome::Stale => {
                debug!("Discarded stale sync result");
                lock(&self.stats).stale_discards += 1;
                Ok(SyncOutcome::Stale)
            }
        }
    }

    /// Nothing new; only republish if this clears an error or idle status
    fn settle_idle(&self) {
        let changed = {
            let mut state = lock(&self.state);
            let before = state.status().clone();
            state.record_idle_poll();
            *state.status() != before
        };
        if changed {
            self.publish();
        }
    }

    fn fail_store(&self, e: StoreError) -> IngestError {
        warn!("Store fetch failed: {}", e);
        self.record_failure(e.to_string());
        IngestError::Store(e)
    }

    fn record_failure(&self, message: String) {
        {
            let mut stats = lock(&self.stats);
            stats.failures += 1;
            stats.last_error = Some(message.clone());
        }
        lock(&self.state).record_failure(message);
        self.publish();
    }

    fn publish(&self) {
        let snapshot = lock(&self.state).snapshot();
        self.publisher.send_replace(Arc::new(snapshot));
    }
}

fn log_transition(transition: AlertTransition) {
    if transition.is_escalation() {
        warn!(
            "Alert escalated: {} -> {}",
            transition.from.name(),
            transition.to.name()
        );
    } else {
        info!(
            "Alert eased: {} -> {}",
            transition.from.name(),
            transition.to.name()
        );
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
