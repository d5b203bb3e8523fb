//! Low-focus alert derived from the aggregated focus percentage.
//!
//! There is no hysteresis: the state is re-evaluated on every aggregation
//! pass and may flip back and forth around the threshold.

use serde::{Deserialize, Serialize};

/// Default focused-percent threshold below which the alert fires.
pub const DEFAULT_LOW_FOCUS_THRESHOLD: u8 = 30;

/// Ambient state consumed by presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    #[default]
    Normal,
    Alert,
}

/// Threshold policy for the low-focus alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    pub threshold: u8,
}

impl AlertPolicy {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// True iff there is at least one sample and focus is under the threshold.
    pub fn is_low_focus(&self, total_samples: usize, focused_percent: u8) -> bool {
        total_samples > 0 && focused_percent < self.threshold
    }

    pub fn evaluate(&self, total_samples: usize, focused_percent: u8) -> AlertState {
        if self.is_low_focus(total_samples, focused_percent) {
            AlertState::Alert
        } else {
            AlertState::Normal
        }
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_FOCUS_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_focus_with_samples() {
        let policy = AlertPolicy::default();
        assert!(policy.is_low_focus(12, 25));
        assert_eq!(policy.evaluate(12, 25), AlertState::Alert);
    }

    #[test]
    fn test_threshold_is_strict() {
        let policy = AlertPolicy::default();
        assert!(!policy.is_low_focus(12, 30));
        assert!(policy.is_low_focus(12, 29));
    }

    #[test]
    fn test_no_samples_never_alerts() {
        let policy = AlertPolicy::default();
        assert!(!policy.is_low_focus(0, 0));
        assert_eq!(policy.evaluate(0, 0), AlertState::Normal);
    }
}
