//! Notification sinks for monitor events
//!
//! The scheduler only publishes [`MonitorEvent`]s. This module turns them
//! into something a person notices: log lines, a console countdown, and an
//! outbound webhook when the target becomes available.
//!
//! # Architecture
//!
//! ```text
//! EventStream ──▶ Notifier ──┬──▶ LogSink      (tracing)
//!                            ├──▶ ConsoleSink  (countdown + alert text)
//!                            └──▶ WebhookSink  (POST on alert)
//! ```
//!
//! Sinks receive events in emission order. A failing sink is logged and
//! skipped; it never affects the monitor or the other sinks.
//!
//! # Example
//!
//! ```rust,ignore
//! use siteprobe::notifications::{ConsoleSink, LogSink, Notifier};
//!
//! let notifier = Notifier::new()
//!     .with_sink(Box::new(LogSink::new()))
//!     .with_sink(Box::new(ConsoleSink::stdout("https://example.com/")));
//!
//! tokio::spawn(notifier.run(scheduler.subscribe()));
//! ```

pub mod channels;
mod manager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler::MonitorEvent;

// Re-exports
pub use channels::console::ConsoleSink;
pub use channels::log::LogSink;
pub use channels::webhook::WebhookSink;
pub use channels::{EventSink, SinkError, SinkResult};
pub use manager::{DeliveryStats, Notifier};

/// User-facing alert raised when the target becomes available
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertNotice {
    /// Target that answered
    pub target_url: String,
    /// Human readable message
    pub message: String,
    /// When the alert was raised
    pub alerted_at: DateTime<Utc>,
}

impl AlertNotice {
    /// Create a notice for `target_url`, timestamped now
    pub fn new(target_url: impl Into<String>) -> Self {
        let target_url = target_url.into();
        Self {
            message: format!("{target_url} is available"),
            target_url,
            alerted_at: Utc::now(),
        }
    }

    /// Build a notice from an alert event
    pub fn from_event(event: &MonitorEvent) -> Option<Self> {
        match event {
            MonitorEvent::Alert { target_url } => Some(Self::new(target_url.clone())),
            _ => None,
        }
    }

    /// Format notice for display
    pub fn format_message(&self) -> String {
        format!(
            "{message} (at {at})",
            message = self.message,
            at = self.alerted_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}
