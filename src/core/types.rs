//! Wire types shared by the client, the aggregation pass and the exporter.
//!
//! These mirror the JSON the telemetry service emits. Snapshots are treated as
//! immutable full replacements: nothing in this crate merges two of them.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One timestamped focus/attention/noise observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// When the observation was taken
    pub timestamp: DateTime<Utc>,
    /// Ambient noise level, absent when the microphone reading failed
    #[serde(default)]
    pub decibels: Option<f64>,
    /// Model-estimated focus level in [0, 1]
    #[serde(default)]
    pub focus_level: f64,
    #[serde(default)]
    pub is_focused: bool,
    #[serde(default)]
    pub is_away: bool,
}

impl Sample {
    /// A sample counts as focused only when the subject is present.
    pub fn counts_as_focused(&self) -> bool {
        self.is_focused && !self.is_away
    }

    /// Decibel value with an absent reading treated as silence.
    pub fn decibels_or_zero(&self) -> f64 {
        self.decibels.unwrap_or(0.0)
    }
}

/// The most recent image analysis attached to a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub is_focused: bool,
    #[serde(default)]
    pub focus_level: f64,
    #[serde(default)]
    pub is_away: bool,
    #[serde(default)]
    pub text_summary: String,
}

/// Full dashboard payload for one session at poll time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// "studying" or "idle"
    #[serde(default)]
    pub status: String,
    /// Server time the snapshot was assembled
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub session_active: bool,
    #[serde(
        default,
        deserialize_with = "empty_datetime_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub session_started: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub samples_count: u64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub last_image_url: Option<String>,
    #[serde(default)]
    pub last_analysis: Option<Analysis>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub focus_history: Vec<Sample>,
}

impl SessionSnapshot {
    /// Summary text of the latest analysis, if the service produced one.
    pub fn summary_text(&self) -> Option<&str> {
        self.last_analysis
            .as_ref()
            .map(|a| a.text_summary.as_str())
            .filter(|s| !s.is_empty())
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn empty_datetime_as_none<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match empty_string_as_none(deserializer)? {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

// The service serializes an empty history as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which session is in view: the live one or a historical one keyed by its
/// start instant.
///
/// Historical identifiers keep the UTC offset they were published with so the
/// `datetime=` lookup reproduces the identifier the service handed out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum SessionId {
    #[default]
    Live,
    Historical(DateTime<FixedOffset>),
}

impl SessionId {
    /// Create a historical identifier from any instant.
    pub fn historical(at: DateTime<FixedOffset>) -> Self {
        SessionId::Historical(at)
    }

    pub fn is_live(&self) -> bool {
        matches!(self, SessionId::Live)
    }

    /// The instant of a historical session in UTC.
    pub fn utc(&self) -> Option<DateTime<Utc>> {
        match self {
            SessionId::Live => None,
            SessionId::Historical(at) => Some(at.with_timezone(&Utc)),
        }
    }

    /// Value sent as the `datetime` query parameter (unencoded).
    pub fn query_value(&self) -> Option<String> {
        match self {
            SessionId::Live => None,
            SessionId::Historical(at) => Some(at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }

    /// Stem used in export filenames: `current` or the UTC ISO-8601 instant.
    pub fn file_stem(&self) -> String {
        match self {
            SessionId::Live => "current".to_string(),
            SessionId::Historical(at) => at
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.query_value() {
            Some(value) => write!(f, "{value}"),
            None => write!(f, "live"),
        }
    }
}

/// Error returned when a session identifier string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSessionIdError(pub String);

impl fmt::Display for ParseSessionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid session identifier '{}': expected 'live' or an RFC 3339 timestamp",
            self.0
        )
    }
}

impl std::error::Error for ParseSessionIdError {}

impl FromStr for SessionId {
    type Err = ParseSessionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("live") || trimmed.eq_ignore_ascii_case("current") {
            return Ok(SessionId::Live);
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(SessionId::Historical)
            .map_err(|_| ParseSessionIdError(s.to_string()))
    }
}

impl Serialize for SessionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_tolerates_service_quirks() {
        let json = r#"{
            "status": "idle",
            "timestamp": "2024-03-04T10:00:00-05:00",
            "session_active": false,
            "duration_seconds": 0,
            "samples_count": 0,
            "last_image_url": "",
            "last_analysis": {"is_focused": false, "focus_level": 0, "is_away": false, "text_summary": ""},
            "focus_history": null
        }"#;

        let snapshot: SessionSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.focus_history.is_empty());
        assert!(snapshot.last_image_url.is_none());
        assert!(snapshot.session_started.is_none());
        assert!(snapshot.summary_text().is_none());
        assert_eq!(snapshot.timestamp.to_rfc3339(), "2024-03-04T15:00:00+00:00");
    }

    #[test]
    fn test_sample_missing_decibels() {
        let json = r#"{"timestamp": "2024-03-04T10:00:00Z", "focus_level": 0.5, "is_focused": true, "is_away": false}"#;
        let sample: Sample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.decibels, None);
        assert_eq!(sample.decibels_or_zero(), 0.0);
        assert!(sample.counts_as_focused());
    }

    #[test]
    fn test_focused_but_away_is_not_focused() {
        let sample = Sample {
            timestamp: Utc::now(),
            decibels: Some(40.0),
            focus_level: 0.9,
            is_focused: true,
            is_away: true,
        };
        assert!(!sample.counts_as_focused());
    }

    #[test]
    fn test_session_id_parsing() {
        assert_eq!("live".parse::<SessionId>().unwrap(), SessionId::Live);
        assert_eq!("current".parse::<SessionId>().unwrap(), SessionId::Live);

        let id: SessionId = "2024-03-04T10:15:00-05:00".parse().unwrap();
        assert_eq!(id.query_value().as_deref(), Some("2024-03-04T10:15:00-05:00"));
        assert_eq!(id.file_stem(), "2024-03-04T15:15:00.000Z");

        assert!("yesterday".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_session_id_serde_as_string() {
        let id: SessionId = "2024-03-04T10:15:00Z".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"2024-03-04T10:15:00Z\"");
        assert_eq!(serde_json::to_string(&SessionId::Live).unwrap(), "\"live\"");

        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
