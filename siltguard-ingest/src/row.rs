//! Raw store rows and their coercion into readings
//!
//! Stores hand back loosely typed JSON values. A row becomes a [`Reading`]
//! only if its value is a JSON number or a string that parses as one;
//! anything else is dropped here, before the engine's own guard runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use siltguard_core::{Reading, Timestamp};

/// One row as delivered by a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRow {
    pub id: u64,
    pub value: Value,
    pub timestamp: Timestamp,
}

impl StoreRow {
    /// Row with a numeric value
    pub fn numeric(id: u64, value: f64, timestamp: Timestamp) -> Self {
        Self {
            id,
            value: serde_json::Number::from_f64(value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            timestamp,
        }
    }

    /// Coerce the value to a float reading
    pub fn to_reading(&self) -> Option<Reading> {
        let value = match &self.value {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        Some(Reading::new(self.id, value as f32, self.timestamp))
    }
}

/// Coerce a batch, returning readings in input order and the drop count
pub fn coerce_rows(rows: Vec<StoreRow>) -> (Vec<Reading>, usize) {
    let total = rows.len();
    let readings: Vec<Reading> = rows.iter().filter_map(StoreRow::to_reading).collect();
    let dropped = total - readings.len();

    if dropped > 0 {
        log::warn!("Dropped {} of {} store rows with non-numeric values", dropped, total);
    }
    (readings, dropped)
}
