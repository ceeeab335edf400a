//! Store Ingestion and Snapshot Publication for SiltGuard
//!
//! ## Overview
//!
//! This crate connects the analytics engine in `siltguard-core` to a backing
//! time-series store and to whatever presents the results. It owns three
//! concerns:
//!
//! - **Fetching**: the [`ReadingStore`] trait is the only way rows enter the
//!   system. Implementations decide transport and retry policy.
//! - **Sync control**: [`IngestionController`] runs full refreshes and
//!   incremental polls, one at a time, and rejects results that arrive stale.
//! - **Scheduling**: [`Scheduler`] ticks live polling on an interval and
//!   executes commands coming from presentation.
//!
//! ## Data Flow
//!
//! ```text
//! ReadingStore ──rows──▶ coerce ──▶ EngineState (guard → window → analytics)
//!                                          │
//!                                          ▼
//!                      watch::Sender<Arc<Snapshot>> ──▶ presentation
//! ```
//!
//! ## Concurrency Model
//!
//! The engine state sits behind one `std::sync::Mutex`. The lock is taken
//! only for the synchronous apply step and is never held across a store
//! fetch, which is the single suspension point of every operation. A second
//! operation arriving while one is in flight is dropped and reported as
//! [`SyncOutcome::Busy`].
//!
//! ## Failure Handling
//!
//! Transport errors never tear anything down: the previous snapshot is
//! republished with an error status and the next tick retries.
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use siltguard_core::{EngineConfig, SystemTime};
//! use siltguard_ingest::{IngestionController, MemoryStore, RangeSelector};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), siltguard_ingest::IngestError> {
//! let store = MemoryStore::new();
//! store.push_value(1, 120.0, 0);
//! store.push_value(2, 180.0, 3_600_000);
//!
//! let (controller, mut snapshots) =
//!     IngestionController::new(store, EngineConfig::default(), SystemTime)?;
//! controller.full_refresh(RangeSelector::All).await?;
//!
//! let snapshot = snapshots.borrow_and_update().clone();
//! assert_eq!(snapshot.cursor, 2);
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod memory;
pub mod range;
pub mod row;
pub mod scheduler;

pub use controller::{IngestionController, SyncOutcome};
pub use memory::{FetchCounts, MemoryStore};
pub use range::{RangeQuery, RangeSelector};
pub use row::StoreRow;
pub use scheduler::{Command, Scheduler, SchedulerHandle};

use siltguard_core::EngineError;
use thiserror::Error;

/// Errors raised by a reading store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store unreachable: {0}")]
    Unreachable(String),

    #[error("Query failed: {0}")]
    Query(String),
}

/// Errors surfaced by sync operations
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Window rejected batch: {0}")]
    Engine(#[from] EngineError),

    #[error("Scheduler stopped")]
    SchedulerClosed,
}

/// Backing time-series store
///
/// Retry and backoff belong to implementations; the controller calls each
/// method at most once per operation.
#[async_trait::async_trait]
pub trait ReadingStore: Send + Sync {
    /// Rows within the query's time range, ordered by id as requested
    async fn fetch_range(&self, query: &RangeQuery) -> Result<Vec<StoreRow>, StoreError>;

    /// Rows with id strictly greater than `cursor`, ascending
    async fn fetch_since(&self, cursor: u64) -> Result<Vec<StoreRow>, StoreError>;

    /// Highest id in the store, `None` when empty
    async fn fetch_latest_id(&self) -> Result<Option<u64>, StoreError>;
}

#[async_trait::async_trait]
impl<S: ReadingStore + ?Sized> ReadingStore for std::sync::Arc<S> {
    async fn fetch_range(&self, query: &RangeQuery) -> Result<Vec<StoreRow>, StoreError> {
        (**self).fetch_range(query).await
    }

    async fn fetch_since(&self, cursor: u64) -> Result<Vec<StoreRow>, StoreError> {
        (**self).fetch_since(cursor).await
    }

    async fn fetch_latest_id(&self) -> Result<Option<u64>, StoreError> {
        (**self).fetch_latest_id().await
    }
}

/// Sync statistics common to all controllers
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncStats {
    /// Full refreshes that reached the store
    pub full_refreshes: u64,
    /// Incremental polls that reached the store
    pub polls: u64,
    /// Readings merged into the window
    pub rows_applied: u64,
    /// Rows dropped before reaching the engine (non-numeric values)
    pub rows_rejected: u64,
    /// Results discarded because they did not advance the cursor
    pub stale_discards: u64,
    /// Requests dropped while another was in flight
    pub busy_drops: u64,
    /// Store or window failures
    pub failures: u64,
    /// Last error message
    pub last_error: Option<String>,
}
