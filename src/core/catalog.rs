//! Date-grouped index of historical sessions.
//!
//! The service publishes a flat list of session start instants. The catalog
//! files each one under the calendar date it falls on in the configured
//! timezone (UTC unless configured otherwise) and keeps every day's sessions
//! in chronological order.

use crate::core::types::SessionId;
use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use std::collections::BTreeMap;

/// Historical sessions grouped by calendar date.
#[derive(Debug, Clone)]
pub struct SessionCatalog {
    /// Timezone whose date boundaries decide which day a session belongs to
    timezone: Tz,
    /// Sessions per date, ascending by instant
    by_date: BTreeMap<NaiveDate, Vec<DateTime<FixedOffset>>>,
}

impl SessionCatalog {
    /// Create an empty catalog grouping dates in the given timezone.
    pub fn empty(timezone: Tz) -> Self {
        Self {
            timezone,
            by_date: BTreeMap::new(),
        }
    }

    /// Build a catalog from session start instants in any order.
    pub fn from_instants<I>(instants: I, timezone: Tz) -> Self
    where
        I: IntoIterator<Item = DateTime<FixedOffset>>,
    {
        let mut catalog = Self::empty(timezone);
        for instant in instants {
            catalog.insert(instant);
        }
        catalog
    }

    /// Build a catalog from the raw identifier strings the service returns.
    ///
    /// Entries that are not RFC 3339 timestamps are skipped and logged.
    pub fn from_raw<I, S>(raw: I, timezone: Tz) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let instants = raw.into_iter().filter_map(|entry| {
            let entry = entry.as_ref();
            match DateTime::parse_from_rfc3339(entry.trim()) {
                Ok(instant) => Some(instant),
                Err(e) => {
                    tracing::warn!("Skipping unparseable session identifier '{}': {}", entry, e);
                    None
                }
            }
        });
        Self::from_instants(instants, timezone)
    }

    /// File one instant under its calendar date, keeping the day sorted.
    pub fn insert(&mut self, instant: DateTime<FixedOffset>) {
        let date = instant.with_timezone(&self.timezone).date_naive();
        let day = self.by_date.entry(date).or_default();
        if let Err(pos) = day.binary_search(&instant) {
            day.insert(pos, instant);
        }
    }

    /// Whether any session happened on this date.
    pub fn is_session_date(&self, date: NaiveDate) -> bool {
        self.by_date.contains_key(&date)
    }

    /// Sessions on this date in chronological order; empty if the date is unknown.
    pub fn times_for(&self, date: NaiveDate) -> Vec<SessionId> {
        self.by_date
            .get(&date)
            .map(|day| day.iter().copied().map(SessionId::Historical).collect())
            .unwrap_or_default()
    }

    /// All dates with sessions, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.by_date.keys().copied()
    }

    /// The most recent historical session, if any.
    pub fn latest(&self) -> Option<SessionId> {
        self.by_date
            .values()
            .next_back()
            .and_then(|day| day.last())
            .copied()
            .map(SessionId::Historical)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Total number of sessions across all dates.
    pub fn len(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

impl Default for SessionCatalog {
    fn default() -> Self {
        Self::empty(Tz::UTC)
    }
}
