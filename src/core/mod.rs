//! Session state and metric derivation for the dashboard.
//!
//! This module contains:
//! - Wire types for samples, snapshots and session identifiers
//! - The date-grouped session catalog and the session selector
//! - The aggregation pass, insight strings and the low-focus alert

pub mod aggregation;
pub mod alert;
pub mod catalog;
pub mod insights;
pub mod selector;
pub mod types;

// Re-export commonly used types
pub use aggregation::{
    decibel_series, focus_percentage, time_distribution, DecibelPoint, DerivedMetrics,
    FocusPercentage, TimeDistribution,
};
pub use alert::{AlertPolicy, AlertState, DEFAULT_LOW_FOCUS_THRESHOLD};
pub use catalog::SessionCatalog;
pub use insights::{Insights, INSIGHT_WINDOW};
pub use selector::SessionSelector;
pub use types::{Analysis, ParseSessionIdError, Sample, SessionId, SessionSnapshot};
