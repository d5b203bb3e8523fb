//! Activity counters for the dashboard client.
//!
//! Tracks what the client has done during this run (polls, failures,
//! discarded responses, exports) so it can be reported on exit.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, ActivityLog, ActivityStats, SharedActivityLog};
