//! Wili Dash - live study-session telemetry dashboard client.
//!
//! This library polls a study-session monitor, derives focus statistics and
//! insight strings from its stream of attention samples, and exports the
//! session in view as a portable JSON document.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Wili Dash                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  Selector   │──▶│   Polling   │──▶│ Aggregation │         │
//! │  │ (live/hist) │   │ (5s ticks)  │   │ + insights  │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │         ▲                 │                 │                │
//! │         │                 ▼                 ▼                │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │   Catalog   │   │   Export    │   │    Alert    │         │
//! │  │ (by date)   │   │   (JSON)    │   │ (low focus) │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wili_dash::{client, core::AlertPolicy, polling};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = client::DashClient::new(client::ApiConfig::default())?;
//! let mut engine = polling::PollingEngine::new(
//!     Arc::new(client),
//!     polling::DEFAULT_POLL_INTERVAL,
//!     AlertPolicy::default(),
//! );
//! engine.start();
//!
//! while let Some(outcome) = engine.next_update().await {
//!     if let polling::PollOutcome::Updated(view) = outcome {
//!         println!("focused {}%", view.metrics.focus.focused_percent);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod client;
pub mod config;
pub mod core;
pub mod export;
pub mod polling;

// Re-export key types at crate root for convenience
pub use activity::{ActivityLog, ActivityStats, SharedActivityLog};
pub use client::{ApiConfig, ClientError, DashClient};
pub use config::{Config, ConfigError};
pub use core::{
    AlertPolicy, AlertState, DerivedMetrics, Insights, SessionCatalog, SessionId,
    SessionSelector, SessionSnapshot,
};
pub use export::{ExportArtifact, ExportError};
pub use polling::{DashboardView, PollOutcome, PollingEngine, SnapshotSource};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
