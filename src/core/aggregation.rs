//! Metric derivation from a session snapshot.
//!
//! Everything here is a pure function of the snapshot. [`DerivedMetrics::from_snapshot`]
//! runs the whole pass at once so renderers never see a mix of values computed
//! from different snapshots.

use crate::core::insights::Insights;
use crate::core::types::{Sample, SessionSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Sample counts per attention state.
///
/// An empty series yields [`TimeDistribution::NoData`] so renderers always
/// have one bucket to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeDistribution {
    Counts {
        focused: usize,
        unfocused: usize,
        away: usize,
    },
    NoData,
}

impl TimeDistribution {
    /// Labelled buckets in display order.
    pub fn buckets(&self) -> Vec<(&'static str, usize)> {
        match *self {
            TimeDistribution::Counts {
                focused,
                unfocused,
                away,
            } => vec![
                ("Focused", focused),
                ("Unfocused", unfocused),
                ("Away", away),
            ],
            TimeDistribution::NoData => vec![("NoData", 1)],
        }
    }

    pub fn total(&self) -> usize {
        match *self {
            TimeDistribution::Counts {
                focused,
                unfocused,
                away,
            } => focused + unfocused + away,
            TimeDistribution::NoData => 0,
        }
    }

    /// Rounded share of a count in the distribution, 0 for no data.
    pub fn percent_of(&self, count: usize) -> u8 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        round_percent(count as f64 / total as f64)
    }
}

/// Focused vs unfocused share, always summing to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusPercentage {
    pub focused_percent: u8,
    pub unfocused_percent: u8,
}

impl FocusPercentage {
    /// Build from a mean focus level in [0, 1].
    pub fn from_average(average: f64) -> Self {
        let focused_percent = round_percent(average);
        Self {
            focused_percent,
            unfocused_percent: 100 - focused_percent,
        }
    }
}

/// One point of the noise chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecibelPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Everything the dashboard derives from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub total_samples: usize,
    /// Focused and not away
    pub focused_samples: usize,
    pub away_samples: usize,
    /// Remainder, clamped at zero
    pub unfocused_samples: usize,
    /// Mean focus level over the series, 0 when empty
    pub average_focus_level: f64,
    pub focus: FocusPercentage,
    pub distribution: TimeDistribution,
    pub decibels: Vec<DecibelPoint>,
    pub insights: Insights,
}

impl DerivedMetrics {
    /// Run the full aggregation pass over a snapshot.
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let samples = &snapshot.focus_history;
        let distribution = time_distribution(snapshot);
        let (focused_samples, unfocused_samples, away_samples) = match distribution {
            TimeDistribution::Counts {
                focused,
                unfocused,
                away,
            } => (focused, unfocused, away),
            TimeDistribution::NoData => (0, 0, 0),
        };
        let average_focus_level = average_focus_level(samples);
        let focus = FocusPercentage::from_average(average_focus_level);
        let decibels = decibel_series(snapshot);
        let insights = Insights::derive(samples, &distribution, focus, &decibels);

        Self {
            total_samples: samples.len(),
            focused_samples,
            away_samples,
            unfocused_samples,
            average_focus_level,
            focus,
            distribution,
            decibels,
            insights,
        }
    }
}

/// Count focused, unfocused and away samples.
pub fn time_distribution(snapshot: &SessionSnapshot) -> TimeDistribution {
    let samples = &snapshot.focus_history;
    if samples.is_empty() {
        return TimeDistribution::NoData;
    }

    let focused = samples.iter().filter(|s| s.counts_as_focused()).count();
    let away = samples.iter().filter(|s| s.is_away).count();
    let unfocused = samples.len().saturating_sub(focused + away);

    TimeDistribution::Counts {
        focused,
        unfocused,
        away,
    }
}

/// Mean-focus-level percentages for the snapshot.
pub fn focus_percentage(snapshot: &SessionSnapshot) -> FocusPercentage {
    FocusPercentage::from_average(average_focus_level(&snapshot.focus_history))
}

/// One decibel point per sample, absent readings as 0.
pub fn decibel_series(snapshot: &SessionSnapshot) -> Vec<DecibelPoint> {
    snapshot
        .focus_history
        .iter()
        .map(|s| DecibelPoint {
            timestamp: s.timestamp,
            value: s.decibels_or_zero(),
        })
        .collect()
}

fn average_focus_level(samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.focus_level).mean()
}

/// Convert a [0, 1] fraction to a whole percent.
pub(crate) fn round_percent(fraction: f64) -> u8 {
    // NaN saturates to 0 in the cast
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(offset_secs: i64, focus_level: f64, is_focused: bool, is_away: bool) -> Sample {
        Sample {
            timestamp: DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc)
                + Duration::seconds(offset_secs),
            decibels: None,
            focus_level,
            is_focused,
            is_away,
        }
    }

    fn snapshot(samples: Vec<Sample>) -> SessionSnapshot {
        SessionSnapshot {
            status: "studying".to_string(),
            timestamp: Utc::now(),
            session_active: true,
            session_started: None,
            duration_seconds: 0,
            samples_count: samples.len() as u64,
            last_image_url: None,
            last_analysis: None,
            focus_history: samples,
        }
    }

    #[test]
    fn test_empty_series_is_no_data() {
        let snap = snapshot(vec![]);
        let metrics = DerivedMetrics::from_snapshot(&snap);

        assert_eq!(metrics.distribution, TimeDistribution::NoData);
        assert_eq!(metrics.distribution.buckets(), vec![("NoData", 1)]);
        assert_eq!(metrics.focus.focused_percent, 0);
        assert_eq!(metrics.focus.unfocused_percent, 100);
        assert_eq!(metrics.insights, Insights::default());
        assert!(metrics.decibels.is_empty());
    }

    #[test]
    fn test_distribution_counts() {
        let mut samples = Vec::new();
        for i in 0..6 {
            samples.push(sample(i, 0.8, true, false));
        }
        samples.push(sample(6, 0.1, false, true));
        samples.push(sample(7, 0.1, false, true));
        samples.push(sample(8, 0.3, false, false));
        samples.push(sample(9, 0.3, false, false));

        let snap = snapshot(samples);
        assert_eq!(
            time_distribution(&snap),
            TimeDistribution::Counts {
                focused: 6,
                unfocused: 2,
                away: 2
            }
        );

        let metrics = DerivedMetrics::from_snapshot(&snap);
        assert_eq!(
            metrics.focused_samples + metrics.unfocused_samples + metrics.away_samples,
            metrics.total_samples
        );
    }

    #[test]
    fn test_focused_and_away_counts_once() {
        let snap = snapshot(vec![sample(0, 0.9, true, true), sample(1, 0.9, true, true)]);
        assert_eq!(
            time_distribution(&snap),
            TimeDistribution::Counts {
                focused: 0,
                unfocused: 0,
                away: 2
            }
        );
    }

    #[test]
    fn test_focus_percentage_rounding() {
        // Mean of 0.674
        let snap = snapshot(vec![
            sample(0, 0.674, true, false),
            sample(1, 0.5, true, false),
            sample(2, 0.848, true, false),
        ]);
        let focus = focus_percentage(&snap);
        assert_eq!(focus.focused_percent, 67);
        assert_eq!(focus.unfocused_percent, 33);
    }

    #[test]
    fn test_percentages_always_sum_to_100() {
        for step in 0..=200 {
            let level = step as f64 / 200.0;
            let snap = snapshot(vec![sample(0, level, true, false)]);
            let focus = focus_percentage(&snap);
            assert_eq!(
                focus.focused_percent as u16 + focus.unfocused_percent as u16,
                100
            );
        }
    }

    #[test]
    fn test_decibel_series_defaults_absent_to_zero() {
        let mut loud = sample(0, 0.5, true, false);
        loud.decibels = Some(61.5);
        let quiet = sample(1, 0.5, true, false);

        let series = decibel_series(&snapshot(vec![loud, quiet]));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].value, 61.5);
        assert_eq!(series[1].value, 0.0);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let snap = snapshot(vec![
            sample(0, 0.2, false, false),
            sample(1, 0.9, true, false),
            sample(2, 0.4, false, true),
        ]);
        assert_eq!(
            DerivedMetrics::from_snapshot(&snap),
            DerivedMetrics::from_snapshot(&snap)
        );
    }

    #[test]
    fn test_round_percent_bounds() {
        assert_eq!(round_percent(f64::NAN), 0);
        assert_eq!(round_percent(1.7), 100);
        assert_eq!(round_percent(-0.2), 0);
        assert_eq!(round_percent(0.005), 1);
    }
}
