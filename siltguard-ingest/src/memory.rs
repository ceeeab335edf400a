//! In-memory reading store
//!
//! Holds rows in a `Vec` behind a mutex. Useful for replay, demos and tests:
//! it can be switched offline to simulate transport failures, given an
//! artificial latency to exercise in-flight races, and it counts every call.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use siltguard_core::{Reading, Timestamp};

use crate::{RangeQuery, ReadingStore, StoreError, StoreRow};

/// Number of calls per store method
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchCounts {
    pub range: usize,
    pub since: usize,
    pub latest: usize,
}

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<StoreRow>,
    offline: bool,
    latency: Option<Duration>,
    counts: FetchCounts,
}

/// Mutex-backed store
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with rows
    pub fn with_rows(rows: Vec<StoreRow>) -> Self {
        let store = Self::new();
        store.lock().rows = rows;
        store
    }

    /// Add a raw row
    pub fn push(&self, row: StoreRow) {
        self.lock().rows.push(row);
    }

    /// Add a numeric row
    pub fn push_value(&self, id: u64, value: f64, timestamp: Timestamp) {
        self.push(StoreRow::numeric(id, value, timestamp));
    }

    /// Add a row with an arbitrary JSON value
    pub fn push_json(&self, id: u64, value: Value, timestamp: Timestamp) {
        self.push(StoreRow { id, value, timestamp });
    }

    /// Add a core reading
    pub fn push_reading(&self, reading: Reading) {
        self.push_value(reading.id, reading.value as f64, reading.timestamp);
    }

    /// Simulate the store being unreachable
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.lock().latency = latency;
    }

    pub fn counts(&self) -> FetchCounts {
        self.lock().counts
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().rows.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call, wait out any latency, then report availability
    async fn enter(&self, count: impl FnOnce(&mut FetchCounts)) -> Result<(), StoreError> {
        let latency = {
            let mut inner = self.lock();
            count(&mut inner.counts);
            inner.latency
        };

        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }

        if self.lock().offline {
            return Err(StoreError::Unreachable("memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReadingStore for MemoryStore {
    async fn fetch_range(&self, query: &RangeQuery) -> Result<Vec<StoreRow>, StoreError> {
        self.enter(|c| c.range += 1).await?;

        let inner = self.lock();
        let mut rows: Vec<StoreRow> = inner
            .rows
            .iter()
            .filter(|row| query.start.map_or(true, |start| row.timestamp >= start))
            .filter(|row| query.end.map_or(true, |end| row.timestamp <= end))
            .cloned()
            .collect();

        rows.sort_by_key(|row| row.id);
        if query.descending {
            rows.reverse();
            rows.truncate(query.limit);
        } else {
            let skip = rows.len().saturating_sub(query.limit);
            rows.drain(..skip);
        }
        Ok(rows)
    }

    async fn fetch_since(&self, cursor: u64) -> Result<Vec<StoreRow>, StoreError> {
        self.enter(|c| c.since += 1).await?;

        let inner = self.lock();
        let mut rows: Vec<StoreRow> = inner.rows.iter().filter(|row| row.id > cursor).cloned().collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    async fn fetch_latest_id(&self) -> Result<Option<u64>, StoreError> {
        self.enter(|c| c.latest += 1).await?;
        Ok(self.lock().rows.iter().map(|row| row.id).max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for id in 1..=5u64 {
            store.push_value(id, id as f64 * 10.0, id * 1000);
        }
        store
    }

    #[tokio::test]
    async fn range_returns_newest_first_with_limit() {
        let store = seeded();
        let query = RangeQuery { start: None, end: None, limit: 3, descending: true };
        let ids: Vec<u64> = store.fetch_range(&query).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }

    #[tokio::test]
    async fn range_filters_by_time() {
        let store = seeded();
        let query = RangeQuery { start: Some(2000), end: Some(3000), limit: 10, descending: true };
        let ids: Vec<u64> = store.fetch_range(&query).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn since_and_latest() {
        let store = seeded();
        let ids: Vec<u64> = store.fetch_since(3).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 5]);
        assert_eq!(store.fetch_latest_id().await.unwrap(), Some(5));
        assert_eq!(MemoryStore::new().fetch_latest_id().await.unwrap(), None);

        let counts = store.counts();
        assert_eq!(counts, FetchCounts { range: 0, since: 1, latest: 1 });
    }

    #[tokio::test]
    async fn offline_store_fails() {
        let store = seeded();
        store.set_offline(true);
        assert!(matches!(
            store.fetch_latest_id().await,
            Err(StoreError::Unreachable(_))
        ));
        store.set_offline(false);
        assert!(store.fetch_latest_id().await.is_ok());
    }
}
