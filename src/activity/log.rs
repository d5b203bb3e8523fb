//! In-memory activity log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current run.
#[derive(Debug)]
pub struct ActivityLog {
    /// Fetches sent for the selection in view
    polls_issued: AtomicU64,
    /// Snapshots that replaced the view
    snapshots_applied: AtomicU64,
    /// Fetches that failed (transport, status or parse)
    poll_failures: AtomicU64,
    /// Responses dropped because a newer selection or request won
    stale_discarded: AtomicU64,
    /// Export artifacts produced
    exports_written: AtomicU64,
    /// When this log was created
    started_at: DateTime<Utc>,
}

impl ActivityLog {
    /// Create a new activity log.
    pub fn new() -> Self {
        Self {
            polls_issued: AtomicU64::new(0),
            snapshots_applied: AtomicU64::new(0),
            poll_failures: AtomicU64::new(0),
            stale_discarded: AtomicU64::new(0),
            exports_written: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_poll_issued(&self) {
        self.polls_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_applied(&self) {
        self.snapshots_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll_failure(&self) {
        self.poll_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_discarded(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_export_written(&self) {
        self.exports_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            polls_issued: self.polls_issued.load(Ordering::Relaxed),
            snapshots_applied: self.snapshots_applied.load(Ordering::Relaxed),
            poll_failures: self.poll_failures.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
            exports_written: self.exports_written.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Dashboard Activity:\n\
             - Polls issued: {}\n\
             - Snapshots applied: {}\n\
             - Poll failures: {}\n\
             - Stale responses discarded: {}\n\
             - Exports written: {}\n\
             - Running for: {} seconds",
            stats.polls_issued,
            stats.snapshots_applied,
            stats.poll_failures,
            stats.stale_discarded,
            stats.exports_written,
            stats.uptime_secs
        )
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the activity counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStats {
    pub polls_issued: u64,
    pub snapshots_applied: u64,
    pub poll_failures: u64,
    pub stale_discarded: u64,
    pub exports_written: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

/// Create a new shared activity log.
pub fn create_shared_log() -> SharedActivityLog {
    Arc::new(ActivityLog::new())
}
