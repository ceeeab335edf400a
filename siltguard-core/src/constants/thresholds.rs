//! Default Turbidity Thresholds
//!
//! Alert ladder used when no site-specific configuration is supplied. Values
//! are NTU and must stay strictly increasing.

/// Upper bound of clear water (NTU).
pub const DEFAULT_NORMAL_NTU: f32 = 100.0;

/// Sediment is visibly building (NTU).
pub const DEFAULT_WARNING_NTU: f32 = 500.0;

/// Flow restriction likely (NTU).
pub const DEFAULT_DANGER_NTU: f32 = 1000.0;

/// Clogging imminent (NTU).
pub const DEFAULT_CRITICAL_NTU: f32 = 1500.0;
