//! Window Analytics Example
//!
//! This example drives the analytics engine directly, without a store:
//! a full refresh loads a day of hourly turbidity, then a few incremental
//! batches push the series through the alert ladder.
//!
//! ## What You'll Learn
//!
//! - Building a validated `EngineConfig`
//! - Applying full and incremental batches to `EngineState`
//! - Reading statistics, accumulation and risk from a `Snapshot`
//! - How malformed readings are screened out
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_window_analytics
//! ```

use siltguard_core::constants::MS_PER_HOUR;
use siltguard_core::{ApplyOutcome, EngineConfig, EngineState, Reading, Snapshot};

fn main() -> Result<(), siltguard_core::EngineError> {
    println!("SiltGuard Window Analytics Example");
    println!("==================================\n");

    let config = EngineConfig::builder()
        .window_capacity(24)
        .trend_lookback(6)
        .build()?;
    let mut engine = EngineState::try_new(config)?;

    // A calm day hovering around 80 NTU
    let day: Vec<Reading> = (1..=24u64)
        .map(|h| Reading::new(h, 80.0 + (h % 4) as f32 * 3.0, h * MS_PER_HOUR))
        .collect();
    let cursor = engine.cursor();
    let outcome = engine.apply_full(&day, cursor, 24 * MS_PER_HOUR)?;
    println!("Full refresh: {:?}", outcome);
    print_snapshot(&engine.snapshot());

    // A storm front: turbidity climbs fast
    let storm = [260.0, 480.0, 720.0, 990.0, 1280.0, 1560.0];
    for (i, value) in storm.iter().enumerate() {
        let id = 25 + i as u64;
        let reading = Reading::new(id, *value, id * MS_PER_HOUR);

        if let ApplyOutcome::Applied { transition: Some(t), .. } =
            engine.apply_incremental(&[reading], id * MS_PER_HOUR)?
        {
            println!(
                "  hour {:>2}: {:>6.1} NTU  alert {} -> {}",
                id,
                value,
                t.from.name(),
                t.to.name()
            );
        }
    }
    println!();
    print_snapshot(&engine.snapshot());

    // Non-finite values and replays are dropped, not applied
    let junk = [
        Reading::new(31, f32::NAN, 31 * MS_PER_HOUR),
        Reading::new(32, 1500.0, 32 * MS_PER_HOUR),
        Reading::new(32, 1510.0, 32 * MS_PER_HOUR),
    ];
    engine.apply_incremental(&junk, 32 * MS_PER_HOUR)?;
    let snapshot = engine.snapshot();
    println!(
        "Guard: {} accepted, {} rejected (cursor now {})",
        snapshot.guard.accepted, snapshot.guard.rejected, snapshot.cursor
    );

    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("Snapshot:");
    println!("  readings:   {}", snapshot.readings.len());
    println!("  latest:     {:.1} NTU", snapshot.stats.latest);
    println!("  average:    {:.2} NTU", snapshot.stats.average);
    println!("  highest:    {:.1} NTU", snapshot.stats.highest);
    println!("  trend:      {}", snapshot.stats.trend.name());
    println!("  rate:       {:.1} NTU/h", snapshot.accumulation.rate);
    match snapshot.accumulation.days_to_clog {
        Some(days) => println!("  clog in:    {:.1} days", days),
        None => println!("  clog in:    n/a"),
    }
    println!("  stability:  {}", snapshot.accumulation.stability_index);
    println!(
        "  bands:      {} / {} / {} / {}",
        snapshot.distribution.normal,
        snapshot.distribution.warning,
        snapshot.distribution.danger,
        snapshot.distribution.critical
    );
    println!("  alert:      {} ({})", snapshot.alert.name(), snapshot.risk.timeframe);
    println!("  action:     {}", snapshot.risk.action);
    println!();
}
