//! Periodic snapshot polling keyed by the current session selection.
//!
//! The engine owns all view state. A ticker task per selection issues one
//! fetch immediately and then one per period; each fetch runs in its own task
//! so a slow response never delays the next tick. Results come back over a
//! channel tagged with the selection generation and a per-selection request
//! number, and [`PollingEngine::apply`] drops anything that no longer matches
//! the current selection or is older than what is already on screen.
//!
//! ```text
//!  select(id) ──▶ generation += 1 ──▶ cancel old ticker ──▶ spawn poll_loop
//!                                                              │ every period
//!                                                              ▼
//!                 apply() ◀── PollEvent::Completed ◀── spawned fetch
//! ```

use crate::activity::{create_shared_log, SharedActivityLog};
use crate::client::ClientError;
use crate::core::{AlertPolicy, AlertState, DerivedMetrics, SessionId, SessionSelector, SessionSnapshot};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Default refresh cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest cadence the engine will run at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Anything that can produce a snapshot for a session.
pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch(
        &self,
        session: &SessionId,
    ) -> impl Future<Output = Result<SessionSnapshot, ClientError>> + Send;
}

/// A snapshot together with everything derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub session: SessionId,
    pub snapshot: SessionSnapshot,
    pub metrics: DerivedMetrics,
    pub alert: AlertState,
    pub received_at: DateTime<Utc>,
}

impl DashboardView {
    /// Run the aggregation pass and alert policy over a fresh snapshot.
    pub fn build(session: SessionId, snapshot: SessionSnapshot, policy: AlertPolicy) -> Self {
        let metrics = DerivedMetrics::from_snapshot(&snapshot);
        let alert = policy.evaluate(metrics.total_samples, metrics.focus.focused_percent);
        Self {
            session,
            snapshot,
            metrics,
            alert,
            received_at: Utc::now(),
        }
    }
}

/// Messages from ticker and fetch tasks back to the engine.
#[derive(Debug)]
pub enum PollEvent {
    /// A fetch was sent
    Issued { generation: u64, request: u64 },
    /// A fetch finished
    Completed {
        generation: u64,
        request: u64,
        session: SessionId,
        result: Result<SessionSnapshot, ClientError>,
    },
}

/// What applying one event did to the view.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// A fetch for the current selection is outstanding
    Loading,
    /// A new view replaced the previous one
    Updated(Arc<DashboardView>),
    /// The fetch failed; the previous view (if any) is kept
    Failed(String),
    /// The event belonged to a superseded selection or an overtaken request
    Discarded,
}

struct Ticker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Restartable periodic fetcher for the selected session.
pub struct PollingEngine<S: SnapshotSource> {
    source: Arc<S>,
    period: Duration,
    policy: AlertPolicy,
    selector: SessionSelector,
    events_tx: mpsc::UnboundedSender<PollEvent>,
    events_rx: mpsc::UnboundedReceiver<PollEvent>,
    ticker: Option<Ticker>,
    /// Fetches issued under the current generation and not yet completed
    outstanding: usize,
    /// Request number of the snapshot currently in view
    last_applied: Option<u64>,
    last_error: Option<String>,
    view: Option<Arc<DashboardView>>,
    activity: SharedActivityLog,
}

impl<S: SnapshotSource> PollingEngine<S> {
    /// Create an idle engine viewing the live session.
    ///
    /// Periods shorter than [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn new(source: Arc<S>, period: Duration, policy: AlertPolicy) -> Self {
        if period < MIN_POLL_INTERVAL {
            tracing::warn!(
                "Poll interval {:?} is too short, using {:?}",
                period,
                MIN_POLL_INTERVAL
            );
        }
        let period = period.max(MIN_POLL_INTERVAL);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            source,
            period,
            policy,
            selector: SessionSelector::new(),
            events_tx,
            events_rx,
            ticker: None,
            outstanding: 0,
            last_applied: None,
            last_error: None,
            view: None,
            activity: create_shared_log(),
        }
    }

    /// Record activity into a shared log instead of a private one.
    pub fn with_activity(mut self, activity: SharedActivityLog) -> Self {
        self.activity = activity;
        self
    }

    /// Begin polling the current selection.
    pub fn start(&mut self) {
        let session = self.selector.current().clone();
        self.select(session);
    }

    /// Switch to another session and restart polling for it.
    ///
    /// The previous view is dropped and any response still in flight for the
    /// old selection will be discarded when it arrives.
    pub fn select(&mut self, session: SessionId) {
        let generation = self.selector.select(session);
        tracing::info!("Viewing session {} (generation {})", self.selector.current(), generation);
        self.view = None;
        self.reset_generation_state();
        self.spawn_ticker();
    }

    /// Re-poll the current selection now, keeping the current view until the
    /// new snapshot arrives.
    pub fn refresh(&mut self) {
        let generation = self.selector.invalidate();
        tracing::debug!("Refreshing session {} (generation {})", self.selector.current(), generation);
        self.reset_generation_state();
        self.spawn_ticker();
    }

    /// Stop polling. In-flight responses will be discarded; the current view
    /// is kept.
    pub fn stop(&mut self) {
        self.cancel_ticker();
        self.selector.invalidate();
        self.reset_generation_state();
    }

    /// Effective polling cadence.
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn selection(&self) -> &SessionId {
        self.selector.current()
    }

    pub fn generation(&self) -> u64 {
        self.selector.generation()
    }

    /// True while a fetch for the current selection is outstanding.
    pub fn loading(&self) -> bool {
        self.outstanding > 0
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn view(&self) -> Option<Arc<DashboardView>> {
        self.view.clone()
    }

    pub fn activity(&self) -> &SharedActivityLog {
        &self.activity
    }

    /// Wait for the next event from the ticker or a fetch and apply it.
    pub async fn next_update(&mut self) -> Option<PollOutcome> {
        let event = self.events_rx.recv().await?;
        Some(self.apply(event))
    }

    /// Apply one event to the engine state.
    pub fn apply(&mut self, event: PollEvent) -> PollOutcome {
        match event {
            PollEvent::Issued { generation, .. } => {
                if !self.selector.is_current(generation) {
                    return PollOutcome::Discarded;
                }
                self.outstanding += 1;
                self.activity.record_poll_issued();
                PollOutcome::Loading
            }
            PollEvent::Completed {
                generation,
                request,
                session,
                result,
            } => {
                if !self.selector.is_current(generation) {
                    tracing::debug!(
                        "Discarding response for superseded selection {} (generation {})",
                        session,
                        generation
                    );
                    self.activity.record_stale_discarded();
                    return PollOutcome::Discarded;
                }
                self.outstanding = self.outstanding.saturating_sub(1);

                if self.last_applied.is_some_and(|last| request < last) {
                    tracing::debug!("Discarding overtaken response #{} for {}", request, session);
                    self.activity.record_stale_discarded();
                    return PollOutcome::Discarded;
                }

                match result {
                    Ok(snapshot) => {
                        self.last_applied = Some(request);
                        self.last_error = None;
                        let view = Arc::new(DashboardView::build(session, snapshot, self.policy));
                        self.view = Some(Arc::clone(&view));
                        self.activity.record_snapshot_applied();
                        PollOutcome::Updated(view)
                    }
                    Err(e) => {
                        let message = e.to_string();
                        tracing::warn!("Poll for session {} failed: {}", session, message);
                        self.last_error = Some(message.clone());
                        self.activity.record_poll_failure();
                        PollOutcome::Failed(message)
                    }
                }
            }
        }
    }

    fn reset_generation_state(&mut self) {
        self.outstanding = 0;
        self.last_applied = None;
    }

    fn spawn_ticker(&mut self) {
        self.cancel_ticker();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.source),
            self.selector.current().clone(),
            self.selector.generation(),
            self.period,
            self.events_tx.clone(),
            cancel.clone(),
        ));
        self.ticker = Some(Ticker { cancel, handle });
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel.cancel();
            // The loop exits on its own; nothing to join.
            drop(ticker.handle);
        }
    }
}

impl<S: SnapshotSource> Drop for PollingEngine<S> {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

async fn poll_loop<S: SnapshotSource>(
    source: Arc<S>,
    session: SessionId,
    generation: u64,
    period: Duration,
    events: mpsc::UnboundedSender<PollEvent>,
    cancel: CancellationToken,
) {
    // The first tick completes immediately.
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut request: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Polling for {} (generation {}) cancelled", session, generation);
                break;
            }
            _ = ticker.tick() => {
                request += 1;
                if events.send(PollEvent::Issued { generation, request }).is_err() {
                    break;
                }

                let source = Arc::clone(&source);
                let events = events.clone();
                let session = session.clone();
                tokio::spawn(async move {
                    let result = source.fetch(&session).await;
                    let _ = events.send(PollEvent::Completed {
                        generation,
                        request,
                        session,
                        result,
                    });
                });
            }
        }
    }
}
