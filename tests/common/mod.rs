//! Common test utilities

use async_trait::async_trait;
use siteprobe::probe::{ProbeOutcome, Prober};
use siteprobe::scheduler::{EventStream, MonitorEvent};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// How a scripted probe behaves before answering
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum Latency {
    /// Answer immediately
    Instant,
    /// Sleep (in tokio time) before answering
    Delay(Duration),
    /// Never answer
    Hang,
}

/// Prober that replays a fixed list of outcomes, then keeps returning the
/// fallback
pub struct ScriptedProber {
    outcomes: Mutex<VecDeque<ProbeOutcome>>,
    fallback: ProbeOutcome,
    latency: Latency,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedProber {
    pub fn new(outcomes: impl IntoIterator<Item = ProbeOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            fallback: ProbeOutcome::Unavailable,
            latency: Latency::Instant,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Always returns `outcome`
    pub fn always(outcome: ProbeOutcome) -> Self {
        Self::new([]).with_fallback(outcome)
    }

    pub fn with_fallback(mut self, outcome: ProbeOutcome) -> Self {
        self.fallback = outcome;
        self
    }

    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the probe future is dropped
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, _url: &Url, _timeout: Duration) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        match self.latency {
            Latency::Instant => {}
            Latency::Delay(d) => tokio::time::sleep(d).await,
            Latency::Hang => std::future::pending::<()>().await,
        }

        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback)
    }
}

/// Drain a stream until the monitor closes it
#[allow(dead_code)]
pub async fn collect(mut events: EventStream) -> Vec<MonitorEvent> {
    let mut out = Vec::new();
    while let Some(event) = events.recv().await {
        out.push(event);
    }
    out
}

/// Count events with the given name
#[allow(dead_code)]
pub fn count(events: &[MonitorEvent], name: &str) -> usize {
    events.iter().filter(|e| e.name() == name).count()
}
