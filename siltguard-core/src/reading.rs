//! Turbidity reading as merged into the window

use crate::time::Timestamp;

/// Single sensor reading
///
/// Immutable once fetched. Ids come from the backing store and increase
/// monotonically across the whole series.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Store-assigned sequence id
    pub id: u64,
    /// Turbidity value (NTU) after any configured transform
    pub value: f32,
    /// Capture time in milliseconds since epoch
    pub timestamp: Timestamp,
}

impl Reading {
    /// Build a reading
    pub const fn new(id: u64, value: f32, timestamp: Timestamp) -> Self {
        Self { id, value, timestamp }
    }
}

/// Check a float is usable in statistics
pub trait Finite {
    /// False for NaN and infinities
    fn is_usable(&self) -> bool;
}

impl Finite for f32 {
    #[inline]
    fn is_usable(&self) -> bool {
        self.is_finite()
    }
}
