//! Tracing-backed sink

use async_trait::async_trait;

use super::{EventSink, SinkResult};
use crate::probe::ProbeOutcome;
use crate::scheduler::MonitorEvent;

/// Writes every event to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, event: &MonitorEvent) -> SinkResult<()> {
        match event {
            MonitorEvent::Tick { remaining_secs } => {
                tracing::debug!(remaining_secs = *remaining_secs, "Retrying soon")
            }
            MonitorEvent::ProbeStarted => tracing::debug!("Probing target"),
            MonitorEvent::Retry {
                outcome: ProbeOutcome::TimedOut,
            } => tracing::warn!("Target did not answer in time"),
            MonitorEvent::Retry { outcome } => {
                tracing::info!(outcome = %outcome, "Target not available")
            }
            MonitorEvent::Alert { target_url } => {
                tracing::info!(target_url = %target_url, "Target available")
            }
            MonitorEvent::Stopped => tracing::info!("Monitoring stopped"),
        }
        Ok(())
    }
}
