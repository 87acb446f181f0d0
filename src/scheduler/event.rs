//! Events emitted by the monitor
//!
//! Subscribers see, in order: any number of `Tick`, `ProbeStarted` and
//! `Retry` events, then at most one terminal `Alert` or `Stopped`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use crate::probe::ProbeOutcome;

/// A state change observed by subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Countdown advanced; `remaining_secs` seconds until the next probe
    Tick { remaining_secs: u64 },

    /// Countdown reached zero and a probe is in flight
    ProbeStarted,

    /// Probe failed; countdown restarted at the full interval
    Retry { outcome: ProbeOutcome },

    /// Target answered; monitoring is over
    Alert { target_url: String },

    /// Monitor was cancelled
    Stopped,
}

impl MonitorEvent {
    /// Short event name, matching the serialized tag
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::ProbeStarted => "probe_started",
            Self::Retry { .. } => "retry",
            Self::Alert { .. } => "alert",
            Self::Stopped => "stopped",
        }
    }

    /// Whether no event can follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Alert { .. } | Self::Stopped)
    }
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tick { remaining_secs } => write!(f, "tick ({remaining_secs}s remaining)"),
            Self::ProbeStarted => write!(f, "probe started"),
            Self::Retry { outcome } => write!(f, "retry after {outcome} probe"),
            Self::Alert { target_url } => write!(f, "alert: {target_url} is available"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Receiving end of a subscription
///
/// Yields `None` once the monitor has emitted its terminal event.
pub type EventStream = mpsc::UnboundedReceiver<MonitorEvent>;

pub(crate) type EventSender = mpsc::UnboundedSender<MonitorEvent>;
