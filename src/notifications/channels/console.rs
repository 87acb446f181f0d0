//! Console sink
//!
//! Renders the countdown the way a status notification would: one line per
//! update, "not available, retrying in N seconds", then a loud alert line
//! with a terminal bell when the target answers.

use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use super::{EventSink, SinkResult};
use crate::notifications::AlertNotice;
use crate::probe::ProbeOutcome;
use crate::scheduler::MonitorEvent;

/// Countdown values at or below this are always rendered
const FINAL_SECONDS: u64 = 5;

const BELL: &str = "\x07";

/// Writes human readable event lines to an output stream
pub struct ConsoleSink {
    target_url: String,
    out: Mutex<Box<dyn Write + Send>>,
    refresh_every: u64,
    bell: bool,
}

impl ConsoleSink {
    /// Create a sink writing to `out`
    pub fn new(target_url: impl Into<String>, out: Box<dyn Write + Send>) -> Self {
        Self {
            target_url: target_url.into(),
            out: Mutex::new(out),
            refresh_every: 1,
            bell: true,
        }
    }

    /// Create a sink writing to standard output
    pub fn stdout(target_url: impl Into<String>) -> Self {
        Self::new(target_url, Box::new(io::stdout()))
    }

    /// Only render every `secs`-th countdown tick (the final seconds are
    /// always shown)
    pub fn with_refresh_every(mut self, secs: u64) -> Self {
        self.refresh_every = secs.max(1);
        self
    }

    /// Ring the terminal bell on alert
    pub fn with_bell(mut self, bell: bool) -> Self {
        self.bell = bell;
        self
    }

    /// Text for an event, or `None` if it should not be shown
    pub fn render(&self, event: &MonitorEvent) -> Option<String> {
        let url = &self.target_url;
        match event {
            MonitorEvent::Tick { remaining_secs } => {
                let n = *remaining_secs;
                (n <= FINAL_SECONDS || n % self.refresh_every == 0)
                    .then(|| format!("{url} is not available, retrying in {n} seconds"))
            }
            MonitorEvent::ProbeStarted => Some(format!("Checking {url} ...")),
            MonitorEvent::Retry {
                outcome: ProbeOutcome::TimedOut,
            } => Some(format!("{url} did not answer in time")),
            MonitorEvent::Retry { .. } => Some(format!("{url} is not available")),
            MonitorEvent::Alert { .. } => {
                let notice = AlertNotice::from_event(event)?;
                let bell = if self.bell { BELL } else { "" };
                Some(format!("{bell}*** {} ***", notice.format_message()))
            }
            MonitorEvent::Stopped => Some(format!("Stopped checking {url}")),
        }
    }
}

#[async_trait]
impl EventSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn deliver(&self, event: &MonitorEvent) -> SinkResult<()> {
        let Some(line) = self.render(event) else {
            return Ok(());
        };

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}
