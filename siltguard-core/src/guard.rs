//! Ingestion guard
//!
//! Screens every fetched batch before it can reach the window. A malformed
//! reading is excluded on its own; the rest of the batch still flows through.
//!
//! Rejection rules, applied in order:
//! - value is NaN or infinite
//! - id does not exceed the previously accepted id
//! - timestamp is earlier than the previously accepted timestamp
//!
//! "Previously accepted" starts from the reading the batch will follow, so an
//! appended batch is also checked against the newest reading in the window.
//!
//! Accepted values then pass through the configured [`ValueTransform`].
//! Equal timestamps are allowed; the accumulation stage skips zero-length
//! spans on its own.

use alloc::vec::Vec;

use crate::config::ValueTransform;
use crate::errors::EngineError;
use crate::reading::{Finite, Reading};

/// Counts from the last screened batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GuardReport {
    /// Readings that passed
    pub accepted: usize,
    /// Readings dropped
    pub rejected: usize,
}

/// Batch screener with the configured value transform
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadingGuard {
    transform: ValueTransform,
}

impl ReadingGuard {
    /// Guard applying `transform` to accepted readings
    pub fn new(transform: ValueTransform) -> Self {
        Self { transform }
    }

    /// Check one reading against the last accepted one
    pub fn check(&self, reading: &Reading, previous: Option<&Reading>) -> Result<(), EngineError> {
        if !reading.value.is_usable() {
            return Err(EngineError::InvalidValue);
        }

        if let Some(prev) = previous {
            if reading.id <= prev.id || reading.timestamp < prev.timestamp {
                return Err(EngineError::NonMonotonic {
                    id: reading.id,
                    previous_id: prev.id,
                });
            }
        }

        Ok(())
    }

    /// Screen an ascending batch, returning the survivors and a report
    pub fn screen<I>(&self, batch: I) -> (Vec<Reading>, GuardReport)
    where
        I: IntoIterator<Item = Reading>,
    {
        self.screen_after(batch, None)
    }

    /// Screen a batch that must follow `previous`
    pub fn screen_after<I>(&self, batch: I, previous: Option<Reading>) -> (Vec<Reading>, GuardReport)
    where
        I: IntoIterator<Item = Reading>,
    {
        let mut accepted: Vec<Reading> = Vec::new();
        let mut report = GuardReport::default();

        for reading in batch {
            match self.check(&reading, accepted.last().or(previous.as_ref())) {
                Ok(()) => {
                    accepted.push(reading);
                    report.accepted += 1;
                }
                Err(_e) => {
                    log_debug!("Dropping reading {}: {}", reading.id, _e);
                    report.rejected += 1;
                }
            }
        }

        // Transform after ordering checks so they see store values
        for reading in accepted.iter_mut() {
            reading.value = self.transform.apply(reading.value);
        }

        if report.rejected > 0 {
            log_warn!(
                "Ingestion guard rejected {} of {} readings",
                report.rejected,
                report.rejected + report.accepted
            );
        }

        (accepted, report)
    }
}
