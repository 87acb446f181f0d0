//! siteprobe - single-target availability monitor
//!
//! Probes one web endpoint on a fixed countdown and raises an alert the first
//! time it answers, then stops.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration loading and validation
//! - [`probe`] - Bounded-timeout reachability checks
//! - [`scheduler`] - Countdown/probe state machine and run loop
//! - [`notifications`] - Sinks that render monitor events
//! - [`error`] - Unified error type
//!
//! # Example
//!
//! ```no_run
//! use siteprobe::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MonitorConfig::new("https://example.com/");
//!     let scheduler = Scheduler::with_http_prober(config)?;
//!
//!     let notifier = Notifier::new().with_sink(Box::new(LogSink::new()));
//!     let delivery = tokio::spawn(notifier.run(scheduler.subscribe()));
//!
//!     let handle = scheduler.start()?;
//!     let state = handle.wait().await;
//!     delivery.await?;
//!     println!("monitor finished: {state}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod notifications;
pub mod probe;
pub mod scheduler;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, MonitorConfig};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::notifications::{ConsoleSink, EventSink, LogSink, Notifier, WebhookSink};
    pub use crate::probe::{HttpProber, ProbeOutcome, Prober};
    pub use crate::scheduler::{MonitorEvent, MonitorHandle, MonitorState, Scheduler};
}

// Direct re-exports for convenience
pub use error::{Error, Result};
pub use probe::ProbeOutcome;
pub use scheduler::{MonitorEvent, MonitorState};
