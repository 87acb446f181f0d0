//! Monitor run loop
//!
//! A [`Scheduler`] owns the configuration, the prober and the state machine.
//! [`Scheduler::start`] validates the configuration and spawns one tokio task
//! that ticks once per second, runs a probe whenever the countdown reaches
//! zero, and publishes every transition to subscribers. The returned
//! [`MonitorHandle`] cancels, observes and awaits that task.
//!
//! All state changes go through [`MonitorState::apply`] while holding a
//! single lock, so a cancel and a late probe result can never both win.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use url::Url;

use super::error::{SchedulerError, SchedulerResult};
use super::event::{EventSender, EventStream, MonitorEvent};
use super::state::{MonitorState, Trigger};
use crate::config::MonitorConfig;
use crate::probe::{HttpProber, ProbeOutcome, Prober};

/// Countdown resolution
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Slack granted to a prober beyond its own timeout before the scheduler
/// gives up on it
pub const PROBE_GRACE: Duration = Duration::from_millis(250);

struct Inner {
    state: MonitorState,
    subscribers: Vec<EventSender>,
}

impl Inner {
    fn publish(&mut self, event: MonitorEvent) {
        let terminal = event.is_terminal();
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());

        // Dropping the senders ends every stream after the terminal event.
        if terminal {
            self.subscribers.clear();
        }
    }
}

struct Shared {
    config: MonitorConfig,
    inner: Mutex<Inner>,
    cancel_tx: watch::Sender<bool>,
    finished_tx: watch::Sender<bool>,
}

impl Shared {
    fn new(config: MonitorConfig) -> Self {
        let state = MonitorState::initial(&config);
        Self {
            config,
            inner: Mutex::new(Inner {
                state,
                subscribers: Vec::new(),
            }),
            cancel_tx: watch::Sender::new(false),
            finished_tx: watch::Sender::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a trigger and publish its event; returns the new state if
    /// anything changed
    fn fire(&self, trigger: Trigger) -> Option<MonitorState> {
        let mut inner = self.lock();
        let transition = inner.state.apply(trigger, &self.config)?;
        inner.state = transition.next.clone();
        inner.publish(transition.event);
        Some(transition.next)
    }

    fn subscribe(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        if !inner.state.is_terminal() {
            inner.subscribers.push(tx);
        }
        rx
    }

    fn state(&self) -> MonitorState {
        self.lock().state.clone()
    }
}

/// Marks the monitor finished however the run loop exits
struct FinishGuard(Arc<Shared>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finished_tx.send_replace(true);
    }
}

/// Availability monitor for a single target
pub struct Scheduler {
    shared: Arc<Shared>,
    prober: Arc<dyn Prober>,
    started: AtomicBool,
}

impl Scheduler {
    /// Create an unstarted scheduler
    pub fn new(config: MonitorConfig, prober: Arc<dyn Prober>) -> Self {
        Self {
            shared: Arc::new(Shared::new(config)),
            prober,
            started: AtomicBool::new(false),
        }
    }

    /// Create a scheduler probing over HTTP with the configured User-Agent
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be created
    pub fn with_http_prober(config: MonitorConfig) -> Result<Self, reqwest::Error> {
        let prober = HttpProber::with_user_agent(config.user_agent.clone())?;
        Ok(Self::new(config, Arc::new(prober)))
    }

    /// Configuration the monitor runs with
    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    /// Register a subscriber that sees every event emitted from now on
    pub fn subscribe(&self) -> EventStream {
        self.shared.subscribe()
    }

    /// Validate the configuration and spawn the run loop
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::InvalidConfig`] if the configuration is rejected;
    ///   nothing is spawned
    /// - [`SchedulerError::NoRuntime`] outside a tokio runtime
    /// - [`SchedulerError::AlreadyStarted`] on a second call
    pub fn start(&self) -> SchedulerResult<MonitorHandle> {
        self.shared.config.validate()?;
        let target = self.shared.config.target()?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyStarted);
        }

        tracing::info!(
            target_url = %target,
            poll_interval_secs = self.shared.config.poll_interval_secs,
            probe_timeout_ms = self.shared.config.probe_timeout_ms,
            "Starting availability monitor"
        );

        runtime.spawn(run(self.shared.clone(), self.prober.clone(), target));

        Ok(MonitorHandle {
            shared: self.shared.clone(),
        })
    }
}

/// Control surface of a running monitor
///
/// Cloning is cheap; every clone controls the same monitor.
#[derive(Clone)]
pub struct MonitorHandle {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle").finish_non_exhaustive()
    }
}

impl MonitorHandle {
    /// Force the monitor into `Stopped`
    ///
    /// Emits a single `Stopped` event unless the monitor already reached a
    /// terminal state, in which case nothing happens. Any probe in flight is
    /// abandoned. Returns whether this call stopped the monitor.
    pub fn cancel(&self) -> bool {
        let stopped = self.shared.fire(Trigger::Cancel).is_some();
        self.shared.cancel_tx.send_replace(true);

        if stopped {
            tracing::info!(target_url = %self.shared.config.target_url, "Monitor cancelled");
        }
        stopped
    }

    /// Register a subscriber that sees every event emitted from now on
    ///
    /// After a terminal state the returned stream is already closed.
    pub fn subscribe(&self) -> EventStream {
        self.shared.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> MonitorState {
        self.shared.state()
    }

    /// Whether the run loop has exited
    pub fn is_finished(&self) -> bool {
        *self.shared.finished_tx.borrow()
    }

    /// Wait for the run loop to exit and return the terminal state
    pub async fn wait(&self) -> MonitorState {
        let mut finished = self.shared.finished_tx.subscribe();
        // The guard lives inside `shared`, so the sender cannot be dropped.
        let _ = finished.wait_for(|done| *done).await;
        self.shared.state()
    }
}

async fn probe_once(prober: &dyn Prober, target: &Url, timeout: Duration) -> ProbeOutcome {
    time::timeout(timeout + PROBE_GRACE, prober.probe(target, timeout))
        .await
        .unwrap_or(ProbeOutcome::TimedOut)
}

async fn run(shared: Arc<Shared>, prober: Arc<dyn Prober>, target: Url) {
    let _guard = FinishGuard(shared.clone());
    let mut cancelled = shared.cancel_tx.subscribe();
    let probe_timeout = shared.config.probe_timeout();

    // The first tick completes immediately.
    let mut ticker = time::interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempt: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancelled.wait_for(|c| *c) => break,
            _ = ticker.tick() => {}
        }

        let Some(state) = shared.fire(Trigger::Tick) else {
            break;
        };

        if let Some(remaining_secs) = state.remaining_secs() {
            tracing::trace!(remaining_secs, "Countdown tick");
            continue;
        }

        attempt += 1;
        tracing::debug!(target_url = %target, attempt, "Probe started");

        let outcome = tokio::select! {
            biased;
            _ = cancelled.wait_for(|c| *c) => {
                tracing::debug!(attempt, "Abandoning in-flight probe");
                break;
            }
            outcome = probe_once(prober.as_ref(), &target, probe_timeout) => outcome,
        };

        match outcome {
            ProbeOutcome::Available => {
                tracing::info!(target_url = %target, attempt, "Target is available")
            }
            ProbeOutcome::Unavailable => {
                tracing::info!(target_url = %target, attempt, "Target unavailable, will retry")
            }
            ProbeOutcome::TimedOut => tracing::warn!(
                target_url = %target,
                attempt,
                timeout_ms = shared.config.probe_timeout_ms,
                "Probe timed out, will retry"
            ),
        }

        match shared.fire(Trigger::Outcome(outcome)) {
            Some(MonitorState::Waiting { .. }) => ticker.reset(),
            Some(_) => break,
            None => {
                tracing::debug!(attempt, outcome = %outcome, "Discarding probe result after stop");
                break;
            }
        }
    }
}
