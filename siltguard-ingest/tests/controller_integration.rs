//! Controller Integration Tests
//!
//! Drives full refreshes and incremental polls against in-memory stores and
//! checks what reaches the published snapshot.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use siltguard_core::constants::MS_PER_HOUR;
use siltguard_core::{
    AlertLevel, EngineConfig, EngineError, FixedTime, SyncStatus, Trend, ValueTransform,
};
use siltguard_ingest::{
    IngestError, IngestionController, MemoryStore, RangeSelector, StoreRow, SyncOutcome,
};

use common::{controller, hourly_store, push_next, ScriptedStore, NOW};

fn ids(controller: &IngestionController<impl siltguard_ingest::ReadingStore, FixedTime>) -> Vec<u64> {
    controller.snapshot().readings.iter().map(|r| r.id).collect()
}

// ============================================================================
// Full Refresh
// ============================================================================

#[tokio::test]
async fn full_refresh_loads_newest_capacity_ascending() {
    let store = hourly_store(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]);
    let controller = controller(store, 5);

    let outcome = controller.full_refresh(RangeSelector::All).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Applied { rows: 5 });

    let snapshot = controller.snapshot();
    assert_eq!(ids(&controller), vec![4, 5, 6, 7, 8]);
    assert_eq!(snapshot.cursor, 8);
    assert_eq!(snapshot.status, SyncStatus::Ready);
    assert_eq!(snapshot.stats.latest, 80.0);
    assert_eq!(snapshot.stats.highest, 80.0);
    assert_eq!(snapshot.stats.average, 60.0);
    assert_eq!(snapshot.last_update_time, Some(NOW));
}

#[tokio::test]
async fn full_refresh_is_idempotent() {
    let store = hourly_store(&[120.0, 140.0, 180.0, 220.0]);
    let clock = Arc::new(FixedTime::new(NOW));
    let (controller, mut snapshots) =
        IngestionController::new(store, common::config(10), Arc::clone(&clock)).unwrap();

    controller.full_refresh(RangeSelector::All).await.unwrap();
    let first = snapshots.borrow_and_update().clone();

    clock.advance(MS_PER_HOUR);
    let outcome = controller.full_refresh(RangeSelector::All).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Unchanged);
    assert!(!snapshots.has_changed().unwrap());

    let second = controller.snapshot();
    assert_eq!(*first, *second);
    assert_eq!(second.last_update_time, Some(NOW));
    assert_eq!(controller.stats().full_refreshes, 2);
}

#[tokio::test]
async fn unchanged_refresh_after_outage_clears_error() {
    let store = Arc::new(hourly_store(&[120.0, 140.0]));
    let (controller, mut snapshots) = IngestionController::new(
        Arc::clone(&store),
        common::config(10),
        FixedTime::new(NOW),
    )
    .unwrap();
    controller.full_refresh(RangeSelector::All).await.unwrap();

    store.set_offline(true);
    assert!(controller.manual_refresh().await.is_err());
    assert!(snapshots.borrow_and_update().status.is_error());

    store.set_offline(false);
    assert_eq!(controller.manual_refresh().await.unwrap(), SyncOutcome::Unchanged);
    assert!(snapshots.has_changed().unwrap());
    assert_eq!(snapshots.borrow_and_update().status, SyncStatus::Ready);
}

#[tokio::test]
async fn past_range_pauses_live_polling() {
    let store = Arc::new(hourly_store(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]));
    let (controller, _rx) = IngestionController::new(
        Arc::clone(&store),
        common::config(10),
        FixedTime::new(NOW),
    )
    .unwrap();
    controller.full_refresh(RangeSelector::All).await.unwrap();
    assert_eq!(controller.cursor(), 6);

    // rows sit at NOW-5h .. NOW; ids 1-3 only
    let past = RangeSelector::Between { start: NOW - 5 * MS_PER_HOUR, end: NOW - 3 * MS_PER_HOUR };
    controller.full_refresh(past).await.unwrap();
    assert_eq!(ids(&controller), vec![1, 2, 3]);
    assert!(!controller.is_live());

    push_next(&store, 70.0);
    assert_eq!(controller.incremental_poll().await.unwrap(), SyncOutcome::Unchanged);
    assert_eq!(ids(&controller), vec![1, 2, 3]);
    assert_eq!(store.counts().since, 0);

    // back to current data: appending works again
    controller.full_refresh(RangeSelector::All).await.unwrap();
    controller.set_live(true);
    push_next(&store, 80.0);
    assert_eq!(
        controller.incremental_poll().await.unwrap(),
        SyncOutcome::Applied { rows: 1 }
    );
    assert_eq!(controller.cursor(), 8);
}

#[tokio::test]
async fn empty_range_keeps_previous_window() {
    let store = hourly_store(&[120.0, 140.0, 180.0]);
    let controller = controller(store, 10);
    controller.full_refresh(RangeSelector::All).await.unwrap();

    let outcome = controller
        .full_refresh(RangeSelector::Between { start: 0, end: 1 })
        .await
        .unwrap();
    assert_eq!(outcome, SyncOutcome::Empty);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, SyncStatus::NoDataForRange);
    assert_eq!(snapshot.readings.len(), 3);
    assert_eq!(snapshot.cursor, 3);
    assert_eq!(controller.last_range(), RangeSelector::Between { start: 0, end: 1 });
}

#[tokio::test]
async fn last_hours_limits_by_age() {
    let store = hourly_store(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
    let controller = controller(store, 10);

    // rows sit at NOW-5h .. NOW
    controller.full_refresh(RangeSelector::LastHours(2)).await.unwrap();
    assert_eq!(ids(&controller), vec![4, 5, 6]);
}

#[tokio::test]
async fn manual_refresh_reuses_last_range() {
    let store = hourly_store(&[10.0, 20.0, 30.0, 40.0]);
    let controller = controller(store, 10);
    controller.full_refresh(RangeSelector::LastHours(1)).await.unwrap();
    assert_eq!(ids(&controller), vec![3, 4]);

    controller.manual_refresh().await.unwrap();
    assert_eq!(ids(&controller), vec![3, 4]);
    assert_eq!(controller.stats().full_refreshes, 2);
}

// ============================================================================
// Incremental Polling
// ============================================================================

#[tokio::test]
async fn poll_without_new_rows_skips_fetch() {
    let store = hourly_store(&[120.0, 140.0, 180.0]);
    let (controller, mut snapshots) =
        IngestionController::new(store, common::config(10), FixedTime::new(NOW)).unwrap();
    controller.full_refresh(RangeSelector::All).await.unwrap();
    let before = snapshots.borrow_and_update().clone();

    let outcome = controller.incremental_poll().await.unwrap();
    assert_eq!(outcome, SyncOutcome::Unchanged);
    assert!(!snapshots.has_changed().unwrap());
    assert!(Arc::ptr_eq(&before, &controller.snapshot()));
}

#[tokio::test]
async fn poll_appends_and_evicts_oldest() {
    let store = Arc::new(hourly_store(&[100.0, 110.0, 120.0, 130.0, 140.0]));
    let (controller, _rx) = IngestionController::new(
        Arc::clone(&store),
        common::config(5),
        FixedTime::new(NOW),
    )
    .unwrap();
    controller.full_refresh(RangeSelector::All).await.unwrap();

    push_next(&store, 150.0);
    push_next(&store, 160.0);
    let outcome = controller.incremental_poll().await.unwrap();
    assert_eq!(outcome, SyncOutcome::Applied { rows: 2 });

    let snapshot = controller.snapshot();
    let ids: Vec<u64> = snapshot.readings.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 4, 5, 6, 7]);
    assert_eq!(snapshot.cursor, 7);
    assert_eq!(snapshot.stats.latest, 160.0);
    assert_eq!(snapshot.stats.highest, 160.0);
    assert_eq!(store.counts().since, 1);
}

#[tokio::test]
async fn overlapping_batch_is_rejected_without_state_change() {
    let row = |id: u64| StoreRow::numeric(id, 50.0 + id as f64, id * MS_PER_HOUR);
    let store = ScriptedStore::default();
    *store.range_rows.lock().unwrap() = vec![row(3), row(2), row(1)];
    *store.since_rows.lock().unwrap() = vec![row(2), row(3), row(4), row(5)];
    *store.latest.lock().unwrap() = Some(5);

    let controller = controller(store, 10);
    controller.full_refresh(RangeSelector::All).await.unwrap();

    let result = controller.incremental_poll().await;
    assert!(matches!(
        result,
        Err(IngestError::Engine(EngineError::InvariantViolation { incoming_id: 2, max_id: 3 }))
    ));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.cursor, 3);
    assert_eq!(snapshot.readings.len(), 3);
    assert!(snapshot.status.is_error());
}

#[tokio::test]
async fn poll_reading_older_than_window_is_dropped() {
    let row = |id: u64, hour: u64| StoreRow::numeric(id, 100.0, hour * MS_PER_HOUR);
    let store = ScriptedStore::default();
    *store.range_rows.lock().unwrap() = vec![row(2, 11), row(1, 10)];
    *store.since_rows.lock().unwrap() = vec![row(3, 1)];
    *store.latest.lock().unwrap() = Some(3);

    let controller = controller(store, 10);
    controller.full_refresh(RangeSelector::All).await.unwrap();

    assert_eq!(controller.incremental_poll().await.unwrap(), SyncOutcome::Unchanged);
    let snapshot = controller.snapshot();
    let stamps: Vec<u64> = snapshot.readings.iter().map(|r| r.timestamp).collect();
    assert_eq!(stamps, vec![10 * MS_PER_HOUR, 11 * MS_PER_HOUR]);
    assert_eq!(snapshot.cursor, 2);
}

#[tokio::test]
async fn stale_poll_result_is_discarded() {
    let row = |id: u64| StoreRow::numeric(id, 10.0, id * MS_PER_HOUR);
    let store = ScriptedStore::default();
    *store.range_rows.lock().unwrap() = vec![row(4), row(3)];
    // store claims something newer but only returns rows already merged
    *store.since_rows.lock().unwrap() = vec![row(2), row(3)];
    *store.latest.lock().unwrap() = Some(9);

    let controller = controller(store, 10);
    controller.full_refresh(RangeSelector::All).await.unwrap();
    let before = controller.snapshot();

    assert_eq!(controller.incremental_poll().await.unwrap(), SyncOutcome::Stale);
    assert_eq!(controller.stats().stale_discards, 1);
    assert!(Arc::ptr_eq(&before, &controller.snapshot()));
}

// ============================================================================
// Failure Handling
// ============================================================================

#[tokio::test]
async fn store_outage_keeps_data_and_recovers() {
    let store = Arc::new(hourly_store(&[120.0, 140.0, 180.0]));
    let (controller, _rx) = IngestionController::new(
        Arc::clone(&store),
        common::config(10),
        FixedTime::new(NOW),
    )
    .unwrap();
    controller.full_refresh(RangeSelector::All).await.unwrap();

    store.set_offline(true);
    assert!(matches!(
        controller.incremental_poll().await,
        Err(IngestError::Store(_))
    ));
    let failed = controller.snapshot();
    assert!(failed.status.is_error());
    assert_eq!(failed.readings.len(), 3);
    assert_eq!(controller.stats().failures, 1);

    store.set_offline(false);
    push_next(&store, 200.0);
    assert_eq!(
        controller.incremental_poll().await.unwrap(),
        SyncOutcome::Applied { rows: 1 }
    );
    let recovered = controller.snapshot();
    assert_eq!(recovered.status, SyncStatus::Ready);
    assert_eq!(recovered.cursor, 4);
}

#[tokio::test]
async fn outage_with_nothing_new_clears_on_next_poll() {
    let store = Arc::new(hourly_store(&[120.0]));
    let (controller, _rx) = IngestionController::new(
        Arc::clone(&store),
        common::config(10),
        FixedTime::new(NOW),
    )
    .unwrap();
    controller.full_refresh(RangeSelector::All).await.unwrap();

    store.set_offline(true);
    assert!(controller.full_refresh(RangeSelector::All).await.is_err());
    store.set_offline(false);

    assert_eq!(controller.incremental_poll().await.unwrap(), SyncOutcome::Unchanged);
    assert_eq!(controller.snapshot().status, SyncStatus::Ready);
}

#[tokio::test]
async fn malformed_rows_are_dropped() {
    let store = MemoryStore::new();
    store.push_value(1, 120.0, MS_PER_HOUR);
    store.push_json(2, json!("murky"), 2 * MS_PER_HOUR);
    store.push_json(3, json!(" 160.5 "), 3 * MS_PER_HOUR);
    store.push_json(4, json!(null), 4 * MS_PER_HOUR);
    let controller = controller(store, 10);

    assert_eq!(
        controller.full_refresh(RangeSelector::All).await.unwrap(),
        SyncOutcome::Applied { rows: 2 }
    );
    let values: Vec<f32> = controller.snapshot().readings.iter().map(|r| r.value).collect();
    assert_eq!(values, vec![120.0, 160.5]);
    assert_eq!(controller.stats().rows_rejected, 2);
}

// ============================================================================
// In-Flight Discipline
// ============================================================================

#[tokio::test(start_paused = true)]
async fn overlapping_requests_are_dropped_as_busy() {
    let store = Arc::new(hourly_store(&[120.0, 140.0]));
    store.set_latency(Some(Duration::from_millis(500)));
    let (controller, _rx) = IngestionController::new(
        Arc::clone(&store),
        common::config(10),
        FixedTime::new(NOW),
    )
    .unwrap();
    let controller = Arc::new(controller);

    let background = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.full_refresh(RangeSelector::All).await })
    };
    tokio::task::yield_now().await;

    assert_eq!(controller.incremental_poll().await.unwrap(), SyncOutcome::Busy);
    assert_eq!(controller.manual_refresh().await.unwrap(), SyncOutcome::Busy);

    let outcome = background.await.unwrap().unwrap();
    assert_eq!(outcome, SyncOutcome::Applied { rows: 2 });
    assert_eq!(controller.stats().busy_drops, 2);
    assert_eq!(store.counts().latest, 0);
}

// ============================================================================
// Analytics Through The Pipeline
// ============================================================================

#[tokio::test]
async fn rising_series_escalates_and_projects_clogging() {
    let store = hourly_store(&[100.0, 200.0, 300.0, 400.0, 500.0]);
    let controller = controller(store, 5);
    controller.full_refresh(RangeSelector::All).await.unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.stats.trend, Trend::Rising);
    assert_eq!(snapshot.stats.average, 300.0);
    // latest sits on the warning bound, rising lifts it one level
    assert_eq!(snapshot.alert, AlertLevel::Danger);
    assert_eq!(snapshot.risk.level, AlertLevel::Danger);

    assert_eq!(snapshot.accumulation.rate, 100.0);
    // (1500 - 500) / 100 h = 10 h
    assert_eq!(snapshot.accumulation.days_to_clog, Some(0.4));
    assert_eq!(snapshot.accumulation.stability_index, 93);
    assert_eq!(snapshot.distribution.total(), 5);
}

#[tokio::test]
async fn exceeding_critical_reports_immediate_risk() {
    let store = hourly_store(&[1400.0, 1450.0, 1600.0]);
    let controller = controller(store, 10);
    controller.full_refresh(RangeSelector::All).await.unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.alert, AlertLevel::Critical);
    assert_eq!(snapshot.risk.timeframe, "Immediate");
    assert_eq!(snapshot.accumulation.projection_label(), "clogged");
}

#[tokio::test]
async fn inverted_sensor_values_are_flipped() {
    let store = hourly_store(&[1900.0, 1850.0]);
    let config = EngineConfig::builder()
        .value_transform(ValueTransform::Inverted { sensor_max: 2000.0 })
        .build()
        .unwrap();
    let (controller, _rx) =
        IngestionController::new(store, config, FixedTime::new(NOW)).unwrap();
    controller.full_refresh(RangeSelector::All).await.unwrap();

    let values: Vec<f32> = controller.snapshot().readings.iter().map(|r| r.value).collect();
    assert_eq!(values, vec![100.0, 150.0]);
}
