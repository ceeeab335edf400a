//! Bounded Reading Window
//!
//! ## Overview
//!
//! The window holds the most recent readings in ascending id order. It is the
//! single piece of mutable history the analytics stages read from, and only
//! the engine state that owns it can change it.
//!
//! ## Invariants
//!
//! - Ids are strictly ascending from front to back
//! - `len() <= capacity()` after every operation
//! - When an append overflows, the oldest readings are evicted first
//!
//! ## Storage
//!
//! Capacity is a runtime setting (100-1000 readings is typical), so the
//! readings live in a `VecDeque` allocated once at `capacity`. Eviction pops
//! from the front.
//!
//! ```text
//! capacity = 4, append [5, 6]
//!
//! before:  [1, 2, 3, 4]
//! push:    [1, 2, 3, 4, 5, 6]
//! evict:         [3, 4, 5, 6]
//! ```

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::errors::{EngineError, EngineResult};
use crate::reading::Reading;

/// Ascending, capacity-bounded sequence of readings
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBuffer {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl WindowBuffer {
    /// Create an empty window
    pub fn new(capacity: usize) -> Self {
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Discard current contents and load an ascending batch
    ///
    /// Used by full refresh. A batch longer than capacity keeps its newest
    /// `capacity` readings.
    pub fn replace(&mut self, readings: &[Reading]) -> EngineResult<()> {
        check_ascending(readings)?;

        let skip = readings.len().saturating_sub(self.capacity);
        self.readings.clear();
        self.readings.extend(readings[skip..].iter().copied());
        Ok(())
    }

    /// Append an ascending batch, then evict from the front down to capacity
    ///
    /// The whole batch is rejected, and the window left untouched, if its
    /// first id does not exceed the current maximum.
    pub fn append(&mut self, readings: &[Reading]) -> EngineResult<()> {
        check_ascending(readings)?;
        self.check_follows(readings)?;

        self.readings.extend(readings.iter().copied());
        while self.readings.len() > self.capacity {
            self.readings.pop_front();
        }
        Ok(())
    }

    /// Reject a batch whose lowest id is not past the current maximum
    pub fn check_follows(&self, readings: &[Reading]) -> EngineResult<()> {
        let lowest = readings.iter().map(|r| r.id).min();
        if let (Some(incoming_id), Some(max_id)) = (lowest, self.max_id()) {
            if incoming_id <= max_id {
                return Err(EngineError::InvariantViolation { incoming_id, max_id });
            }
        }
        Ok(())
    }

    /// Whether the window holds exactly `readings`, in order
    pub fn holds(&self, readings: &[Reading]) -> bool {
        self.readings.len() == readings.len() && self.readings.iter().eq(readings.iter())
    }

    /// Readings held
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// True before the first batch
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Maximum readings held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest reading
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.back()
    }

    /// Newest id held, if any
    pub fn max_id(&self) -> Option<u64> {
        self.readings.back().map(|r| r.id)
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Reading> + ExactSizeIterator + '_ {
        self.readings.iter()
    }

    /// Iterate values oldest to newest
    pub fn values(&self) -> impl DoubleEndedIterator<Item = f32> + ExactSizeIterator + '_ {
        self.readings.iter().map(|r| r.value)
    }

    /// Copy out for publishing
    pub fn to_vec(&self) -> Vec<Reading> {
        self.readings.iter().copied().collect()
    }
}

/// Batches handed to the window must already be strictly ascending
fn check_ascending(readings: &[Reading]) -> EngineResult<()> {
    for pair in readings.windows(2) {
        if pair[1].id <= pair[0].id {
            return Err(EngineError::InvariantViolation {
                incoming_id: pair[1].id,
                max_id: pair[0].id,
            });
        }
    }
    Ok(())
}
