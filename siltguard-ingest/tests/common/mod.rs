//! Shared fixtures for ingestion integration tests
//!
//! - Controller/store builders with a fixed clock
//! - Series generators on an hourly grid
//! - A scripted store for contract-breaking deliveries

#![allow(dead_code)]

use std::sync::Mutex;

use siltguard_core::constants::MS_PER_HOUR;
use siltguard_core::{EngineConfig, FixedTime, ThresholdConfig};
use siltguard_ingest::{
    IngestionController, MemoryStore, RangeQuery, ReadingStore, StoreError, StoreRow,
};

/// Clock used by every fixture controller
pub const NOW: u64 = 1_000 * MS_PER_HOUR;

/// Ladder used throughout the tests
pub fn thresholds() -> ThresholdConfig {
    ThresholdConfig::new(100.0, 500.0, 1000.0, 1500.0).unwrap()
}

pub fn config(capacity: usize) -> EngineConfig {
    EngineConfig::builder()
        .window_capacity(capacity)
        .accumulation_lookback(capacity.min(7) - 1)
        .poll_interval_ms(1_000)
        .thresholds(thresholds())
        .build()
        .unwrap()
}

/// Store seeded with `values` at ids 1.. on an hourly grid ending at NOW
pub fn hourly_store(values: &[f64]) -> MemoryStore {
    let store = MemoryStore::new();
    let start = NOW - values.len() as u64 * MS_PER_HOUR;
    for (i, value) in values.iter().enumerate() {
        let id = i as u64 + 1;
        store.push_value(id, *value, start + id * MS_PER_HOUR);
    }
    store
}

/// Append one more hourly row after the store's newest
pub fn push_next(store: &MemoryStore, value: f64) -> u64 {
    let id = store.len() as u64 + 1;
    store.push_value(id, value, NOW + id * MS_PER_HOUR);
    id
}

pub fn controller<S: ReadingStore>(
    store: S,
    capacity: usize,
) -> IngestionController<S, FixedTime> {
    let (controller, _rx) =
        IngestionController::new(store, config(capacity), FixedTime::new(NOW)).unwrap();
    controller
}

/// Store that replays canned answers regardless of the cursor
#[derive(Default)]
pub struct ScriptedStore {
    pub range_rows: Mutex<Vec<StoreRow>>,
    pub since_rows: Mutex<Vec<StoreRow>>,
    pub latest: Mutex<Option<u64>>,
}

#[async_trait::async_trait]
impl ReadingStore for ScriptedStore {
    async fn fetch_range(&self, _query: &RangeQuery) -> Result<Vec<StoreRow>, StoreError> {
        Ok(self.range_rows.lock().unwrap().clone())
    }

    async fn fetch_since(&self, _cursor: u64) -> Result<Vec<StoreRow>, StoreError> {
        Ok(self.since_rows.lock().unwrap().clone())
    }

    async fn fetch_latest_id(&self) -> Result<Option<u64>, StoreError> {
        Ok(*self.latest.lock().unwrap())
    }
}
