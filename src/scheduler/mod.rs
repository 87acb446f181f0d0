//! Availability scheduler
//!
//! This module drives repeated probes against one target and turns their
//! outcomes into a stream of events.
//!
//! # Overview
//!
//! The scheduler counts down from `poll_interval_secs`, emitting a tick every
//! second. When the countdown reaches zero it probes the target. A successful
//! probe raises a single alert and ends monitoring; any other outcome restarts
//! the countdown at the full interval. There is no backoff and no failure
//! threshold: the monitor retries until the target answers or it is
//! cancelled.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!   start() ───▶  │          run loop            │ ───▶ subscribers
//!   cancel() ──▶  │  interval(1s) ─▶ apply(Tick) │      (EventStream)
//!                 │  probe ─────▶ apply(Outcome) │
//!                 └──────────────┬───────────────┘
//!                                │
//!                         ┌──────▼──────┐
//!                         │ MonitorState│  Waiting ─▶ Probing ─▶ Alerted
//!                         └─────────────┘      ▲          │
//!                                              └──Retry───┘
//! ```
//!
//! # Modules
//!
//! - [`state`] - Pure transition function over [`MonitorState`]
//! - [`event`] - Events delivered to subscribers
//! - [`monitor`] - Run loop, [`Scheduler`] and [`MonitorHandle`]
//! - [`error`] - Start-up errors
//!
//! # Quick Start
//!
//! ```no_run
//! use siteprobe::config::MonitorConfig;
//! use siteprobe::scheduler::{MonitorEvent, Scheduler};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = Scheduler::with_http_prober(MonitorConfig::new("https://example.com/"))?;
//! let mut events = scheduler.subscribe();
//! let handle = scheduler.start()?;
//!
//! while let Some(event) = events.recv().await {
//!     if let MonitorEvent::Tick { remaining_secs } = event {
//!         println!("retrying in {remaining_secs} seconds");
//!     }
//! }
//! println!("finished in state {}", handle.state());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod event;
pub mod monitor;
pub mod state;

pub use error::{SchedulerError, SchedulerResult};
pub use event::{EventStream, MonitorEvent};
pub use monitor::{MonitorHandle, Scheduler, PROBE_GRACE, TICK_PERIOD};
pub use state::{MonitorState, Transition, Trigger};
