//! Hysteretic Alert Classification
//!
//! ## Overview
//!
//! The alert level combines where the value sits against the threshold ladder
//! with where it is heading. Rules are evaluated top-down, first match wins:
//!
//! ```text
//! latest >= critical  or  average >= critical   -> Critical
//! latest >= danger    or  average >= danger     -> Danger   (+1 if rising)
//! latest >= warning   or  average >= warning    -> Warning  (+1 if rising)
//! latest >= normal                              -> Normal   (+1 if rising)
//! otherwise                                     -> Normal
//! ```
//!
//! A rising trend escalates the nominal tier by exactly one level, capped at
//! Critical. Falling and stable trends leave the nominal tier alone.
//!
//! The lowest escalating tier checks only `latest`, not `average`; the three
//! upper tiers check both. The asymmetry is deliberate and preserved.
//!
//! ## Risk assessment
//!
//! Each level maps to static guidance text. The only branch inside a level is
//! for Critical: a value already at or past the critical bound gets an
//! immediate timeframe, while a Critical reached by trend escalation gets a
//! short lead time.

use crate::config::ThresholdConfig;
use crate::stats::{StatsSnapshot, Trend};

/// Alert tiers in ascending severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlertLevel {
    /// No action needed
    #[default]
    Normal,
    /// Elevated; inspect soon
    Warning,
    /// High; prepare to flush
    Danger,
    /// At or beyond the critical bound
    Critical,
}

impl AlertLevel {
    /// One tier up, saturating at Critical
    pub const fn escalate(self) -> Self {
        match self {
            AlertLevel::Normal => AlertLevel::Warning,
            AlertLevel::Warning => AlertLevel::Danger,
            AlertLevel::Danger | AlertLevel::Critical => AlertLevel::Critical,
        }
    }

    /// Lowercase name for logs and presentation
    pub const fn name(&self) -> &'static str {
        match self {
            AlertLevel::Normal => "normal",
            AlertLevel::Warning => "warning",
            AlertLevel::Danger => "danger",
            AlertLevel::Critical => "critical",
        }
    }
}

/// Classify the current statistics against the threshold ladder
pub fn classify(latest: f32, average: f32, trend: Trend, thresholds: &ThresholdConfig) -> AlertLevel {
    let rising = trend == Trend::Rising;
    let at_least = |bound: f32| latest >= bound || average >= bound;

    if at_least(thresholds.critical()) {
        return AlertLevel::Critical;
    }

    let nominal = if at_least(thresholds.danger()) {
        AlertLevel::Danger
    } else if at_least(thresholds.warning()) {
        AlertLevel::Warning
    } else if latest >= thresholds.normal() {
        AlertLevel::Normal
    } else {
        return AlertLevel::Normal;
    };

    if rising {
        nominal.escalate()
    } else {
        nominal
    }
}

/// Qualitative guidance for an alert level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RiskAssessment {
    /// Level this guidance applies to
    pub level: AlertLevel,
    /// How soon to act
    pub timeframe: &'static str,
    /// What to do
    pub action: &'static str,
    /// Likelihood of a blockage, as text
    pub probability_range: &'static str,
    /// What happens if nothing is done
    pub consequences: &'static str,
}

const NORMAL_RISK: RiskAssessment = RiskAssessment {
    level: AlertLevel::Normal,
    timeframe: "No action window",
    action: "Continue routine monitoring",
    probability_range: "0-5%",
    consequences: "None expected",
};

const WARNING_RISK: RiskAssessment = RiskAssessment {
    level: AlertLevel::Warning,
    timeframe: "Within 7 days",
    action: "Schedule an intake and filter inspection",
    probability_range: "5-25%",
    consequences: "Gradual loss of flow capacity",
};

const DANGER_RISK: RiskAssessment = RiskAssessment {
    level: AlertLevel::Danger,
    timeframe: "Within 48 hours",
    action: "Prepare flushing and notify the maintenance crew",
    probability_range: "25-60%",
    consequences: "Reduced throughput and filter stress",
};

const CRITICAL_ESCALATED_RISK: RiskAssessment = RiskAssessment {
    level: AlertLevel::Critical,
    timeframe: "Within 24 hours",
    action: "Flush the line before the critical bound is reached",
    probability_range: "60-85%",
    consequences: "Blockage likely if sediment keeps rising",
};

const CRITICAL_EXCEEDED_RISK: RiskAssessment = RiskAssessment {
    level: AlertLevel::Critical,
    timeframe: "Immediate",
    action: "Flush or bypass the line now",
    probability_range: "85-100%",
    consequences: "Blockage and equipment damage",
};

impl RiskAssessment {
    /// Static lookup keyed by level; `latest` only splits the Critical entry
    pub fn lookup(level: AlertLevel, latest: f32, thresholds: &ThresholdConfig) -> Self {
        match level {
            AlertLevel::Normal => NORMAL_RISK,
            AlertLevel::Warning => WARNING_RISK,
            AlertLevel::Danger => DANGER_RISK,
            AlertLevel::Critical if latest >= thresholds.critical() => CRITICAL_EXCEEDED_RISK,
            AlertLevel::Critical => CRITICAL_ESCALATED_RISK,
        }
    }
}

impl Default for RiskAssessment {
    fn default() -> Self {
        NORMAL_RISK
    }
}

/// Level change between two published evaluations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertTransition {
    /// Level before the change
    pub from: AlertLevel,
    /// Level after the change
    pub to: AlertLevel,
}

impl AlertTransition {
    /// True when the new level is higher
    pub fn is_escalation(&self) -> bool {
        self.to > self.from
    }
}

/// Result of one classification pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertEvaluation {
    /// Classified level
    pub level: AlertLevel,
    /// Guidance for `level`
    pub risk: RiskAssessment,
    /// Set when `level` differs from the previous evaluation
    pub transition: Option<AlertTransition>,
}

/// Classifier that remembers the last level it reported
#[derive(Debug, Clone)]
pub struct AlertClassifier {
    thresholds: ThresholdConfig,
    current: AlertLevel,
}

impl AlertClassifier {
    /// Start at `Normal` with the given ladder
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self {
            thresholds,
            current: AlertLevel::Normal,
        }
    }

    /// Classify and record the new level
    pub fn evaluate(&mut self, stats: &StatsSnapshot) -> AlertEvaluation {
        let level = classify(stats.latest, stats.average, stats.trend, &self.thresholds);
        let risk = RiskAssessment::lookup(level, stats.latest, &self.thresholds);

        let transition = (level != self.current).then_some(AlertTransition {
            from: self.current,
            to: level,
        });
        self.current = level;

        AlertEvaluation { level, risk, transition }
    }

    /// Level of the last evaluation
    pub fn current(&self) -> AlertLevel {
        self.current
    }
}
