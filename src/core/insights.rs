//! Short natural-language summaries of each metric's current tier.
//!
//! Thresholds are fixed. Every insight is the empty string when there is not
//! enough data to say anything.

use crate::core::aggregation::{round_percent, DecibelPoint, FocusPercentage, TimeDistribution};
use crate::core::types::Sample;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Number of trailing decibel points the noise insight looks at.
pub const INSIGHT_WINDOW: usize = 20;

const HIGH_NOISE_DB: f64 = 70.0;
const MODERATE_NOISE_DB: f64 = 55.0;

const FRAGMENTED_AWAY_PERCENT: u8 = 30;
const STRONG_FOCUS_SHARE: u8 = 70;
const MIXED_FOCUS_SHARE: u8 = 40;

const EXCELLENT_FOCUS_PERCENT: u8 = 80;
const GOOD_FOCUS_PERCENT: u8 = 60;
const FAIR_FOCUS_PERCENT: u8 = 40;

/// Focus-level change smaller than this reads as steady.
const STEADY_DELTA: f64 = 0.05;

/// The four insight strings shown under the charts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    pub decibel: String,
    pub time_distribution: String,
    pub focus: String,
    pub trend: String,
}

impl Insights {
    pub fn derive(
        samples: &[Sample],
        distribution: &TimeDistribution,
        focus: FocusPercentage,
        decibels: &[DecibelPoint],
    ) -> Self {
        Self {
            decibel: decibel_insight(decibels),
            time_distribution: distribution_insight(distribution),
            focus: focus_insight(samples.len(), focus),
            trend: trend_insight(samples),
        }
    }
}

/// Noise tier over the last [`INSIGHT_WINDOW`] points.
pub fn decibel_insight(points: &[DecibelPoint]) -> String {
    if points.is_empty() {
        return String::new();
    }

    let start = points.len().saturating_sub(INSIGHT_WINDOW);
    let average = points[start..].iter().map(|p| p.value).mean();

    if average >= HIGH_NOISE_DB {
        format!(
            "High noise (avg {average:.0} dB). Consider a quieter spot or headphones."
        )
    } else if average >= MODERATE_NOISE_DB {
        format!("Moderate background noise (avg {average:.0} dB).")
    } else {
        format!("Quiet surroundings (avg {average:.0} dB), good for focus.")
    }
}

/// How the session splits between focused, unfocused and away time.
pub fn distribution_insight(distribution: &TimeDistribution) -> String {
    let TimeDistribution::Counts {
        focused,
        unfocused,
        away,
    } = *distribution
    else {
        return String::new();
    };

    let focused_share = distribution.percent_of(focused);
    let away_share = distribution.percent_of(away);

    if away_share >= FRAGMENTED_AWAY_PERCENT {
        format!("Fragmented session: away from the desk {away_share}% of the time.")
    } else if focused_share >= STRONG_FOCUS_SHARE {
        format!("Strong focus: {focused_share}% of samples were focused.")
    } else if focused_share >= MIXED_FOCUS_SHARE {
        let unfocused_share = distribution.percent_of(unfocused);
        format!("Mixed focus: {focused_share}% focused, {unfocused_share}% distracted.")
    } else {
        format!("Low focus: only {focused_share}% of samples were focused.")
    }
}

/// Tier of the average focus percentage.
pub fn focus_insight(total_samples: usize, focus: FocusPercentage) -> String {
    if total_samples == 0 {
        return String::new();
    }

    let percent = focus.focused_percent;
    if percent >= EXCELLENT_FOCUS_PERCENT {
        format!("Excellent focus at {percent}%. Keep it up.")
    } else if percent >= GOOD_FOCUS_PERCENT {
        format!("Good focus at {percent}%.")
    } else if percent >= FAIR_FOCUS_PERCENT {
        format!("Fair focus at {percent}%. Try trimming distractions.")
    } else {
        format!("Focus is low at {percent}%. A short break may help.")
    }
}

/// Direction of the last step in focus level.
pub fn trend_insight(samples: &[Sample]) -> String {
    let [.., previous, last] = samples else {
        return String::new();
    };

    let delta = last.focus_level - previous.focus_level;
    if delta.abs() < STEADY_DELTA {
        format!("Focus steady at {}%.", round_percent(last.focus_level))
    } else {
        let points = (delta * 100.0).round() as i64;
        if delta > 0.0 {
            format!("Focus improving (+{points}%).")
        } else {
            format!("Focus dipping ({points}%).")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn points(values: &[f64]) -> Vec<DecibelPoint> {
        let start = Utc::now();
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| DecibelPoint {
                timestamp: start + Duration::seconds(i as i64),
                value,
            })
            .collect()
    }

    fn levels(values: &[f64]) -> Vec<Sample> {
        let start = Utc::now();
        values
            .iter()
            .enumerate()
            .map(|(i, &focus_level)| Sample {
                timestamp: start + Duration::seconds(i as i64),
                decibels: None,
                focus_level,
                is_focused: focus_level >= 0.5,
                is_away: false,
            })
            .collect()
    }

    #[test]
    fn test_decibel_tiers() {
        assert!(decibel_insight(&points(&[72.0; 20])).starts_with("High noise"));
        assert!(decibel_insight(&points(&[55.0, 60.0])).starts_with("Moderate"));
        assert!(decibel_insight(&points(&[30.0])).starts_with("Quiet"));
        assert_eq!(decibel_insight(&[]), "");
    }

    #[test]
    fn test_decibel_only_uses_trailing_window() {
        // Ten quiet points followed by twenty loud ones averaging 72.
        let mut values = vec![10.0; 10];
        values.extend([70.0, 74.0].repeat(10));
        let insight = decibel_insight(&points(&values));
        assert!(insight.starts_with("High noise"));
        assert!(insight.contains("72 dB"));
    }

    #[test]
    fn test_distribution_tiers() {
        let fragmented = TimeDistribution::Counts {
            focused: 5,
            unfocused: 2,
            away: 3,
        };
        assert!(distribution_insight(&fragmented).starts_with("Fragmented"));

        let strong = TimeDistribution::Counts {
            focused: 8,
            unfocused: 1,
            away: 1,
        };
        assert!(distribution_insight(&strong).starts_with("Strong focus"));

        let mixed = TimeDistribution::Counts {
            focused: 5,
            unfocused: 4,
            away: 1,
        };
        assert!(distribution_insight(&mixed).starts_with("Mixed focus"));

        let low = TimeDistribution::Counts {
            focused: 1,
            unfocused: 8,
            away: 1,
        };
        assert!(distribution_insight(&low).starts_with("Low focus"));

        assert_eq!(distribution_insight(&TimeDistribution::NoData), "");
    }

    #[test]
    fn test_focus_tiers() {
        let tier = |p: u8| {
            focus_insight(
                4,
                FocusPercentage {
                    focused_percent: p,
                    unfocused_percent: 100 - p,
                },
            )
        };
        assert!(tier(80).starts_with("Excellent"));
        assert!(tier(60).starts_with("Good"));
        assert!(tier(40).starts_with("Fair"));
        assert!(tier(39).starts_with("Focus is low"));
        assert_eq!(focus_insight(0, FocusPercentage::from_average(0.0)), "");
    }

    #[test]
    fn test_trend_dip() {
        assert_eq!(trend_insight(&levels(&[0.9, 0.50, 0.40])), "Focus dipping (-10%).");
    }

    #[test]
    fn test_trend_improving_and_steady() {
        assert_eq!(trend_insight(&levels(&[0.40, 0.55])), "Focus improving (+15%).");
        assert_eq!(trend_insight(&levels(&[0.70, 0.72])), "Focus steady at 72%.");
    }

    #[test]
    fn test_trend_needs_two_samples() {
        assert_eq!(trend_insight(&levels(&[0.5])), "");
        assert_eq!(trend_insight(&[]), "");
    }
}
