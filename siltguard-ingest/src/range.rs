//! Time range selection for full refreshes

use serde::{Deserialize, Serialize};
use siltguard_core::constants::MS_PER_HOUR;
use siltguard_core::Timestamp;

/// Which slice of history a full refresh loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSelector {
    /// Most recent readings regardless of age
    #[default]
    All,
    /// Readings from the last N hours
    LastHours(u32),
    /// Readings between two instants (inclusive)
    Between { start: Timestamp, end: Timestamp },
}

/// Store-level query produced from a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub limit: usize,
    pub descending: bool,
}

impl RangeSelector {
    /// Newest `limit` rows of the range, newest first
    pub fn to_query(&self, now: Timestamp, limit: usize) -> RangeQuery {
        let (start, end) = match *self {
            RangeSelector::All => (None, None),
            RangeSelector::LastHours(hours) => {
                (Some(now.saturating_sub(hours as u64 * MS_PER_HOUR)), None)
            }
            RangeSelector::Between { start, end } => (Some(start), Some(end)),
        };

        RangeQuery {
            start,
            end,
            limit,
            descending: true,
        }
    }
}
