//! Live Replay Example
//!
//! This example wires an in-memory store to the ingestion controller and
//! scheduler, replays a short turbidity series into the store while the
//! scheduler polls, and prints every snapshot that gets published.
//!
//! ## What You'll Learn
//!
//! - Creating an `IngestionController` and subscribing to snapshots
//! - Driving it with a `Scheduler` and `SchedulerHandle` commands
//! - How a store outage surfaces as an error status and then recovers
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run -p siltguard-ingest --example 02_live_replay
//! ```

use std::sync::Arc;
use std::time::Duration;

use siltguard_core::{EngineConfig, SystemTime, TimeSource};
use siltguard_ingest::{IngestError, IngestionController, MemoryStore, RangeSelector, Scheduler};

const SERIES: [f64; 12] = [
    85.0, 90.0, 120.0, 180.0, 260.0, 410.0, 560.0, 700.0, 880.0, 1050.0, 1320.0, 1610.0,
];

#[tokio::main]
async fn main() -> Result<(), IngestError> {
    println!("SiltGuard Live Replay Example");
    println!("=============================\n");

    let store = Arc::new(MemoryStore::new());
    let config = EngineConfig::builder()
        .window_capacity(8)
        .trend_lookback(4)
        .accumulation_lookback(3)
        .poll_interval_ms(250)
        .build()?;

    let (controller, mut snapshots) =
        IngestionController::new(Arc::clone(&store), config, SystemTime)?;
    let controller = Arc::new(controller);
    let (scheduler, handle) = Scheduler::new(Arc::clone(&controller));
    let task = scheduler.spawn();

    // Print whatever gets published
    let printer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if snapshot.status.is_error() {
                println!("  [stale] {:?}", snapshot.status);
                continue;
            }
            if let Some(latest) = snapshot.latest() {
                println!(
                    "  id {:>2}  {:>7.1} NTU  avg {:>7.2}  {:<8} {:<8} clog {}",
                    latest.id,
                    latest.value,
                    snapshot.stats.average,
                    snapshot.stats.trend.name(),
                    snapshot.alert.name(),
                    snapshot
                        .accumulation
                        .days_to_clog
                        .map_or("n/a".to_string(), |d| format!("{:.1}d", d)),
                );
            }
        }
    });

    handle.full_refresh(RangeSelector::LastHours(24)).await?;

    for (i, value) in SERIES.iter().enumerate() {
        if i == 6 {
            println!("  -- store goes offline --");
            store.set_offline(true);
        }
        if i == 8 {
            println!("  -- store back online --");
            store.set_offline(false);
        }

        store.push_value(i as u64 + 1, *value, SystemTime.now());
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    tokio::time::sleep(Duration::from_millis(500)).await;
    handle.shutdown().await?;
    let _ = task.await;
    drop(controller);
    let _ = printer.await;

    println!("\nDone.");
    Ok(())
}
