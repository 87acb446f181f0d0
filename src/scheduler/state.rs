//! Monitor state machine
//!
//! [`MonitorState::apply`] is the whole transition table. It is pure and
//! total: every state/trigger pair either yields a [`Transition`] or is
//! ignored (`None`). The run loop only feeds it triggers and publishes the
//! resulting events.
//!
//! | State       | Trigger             | Next        | Event          |
//! |-------------|---------------------|-------------|----------------|
//! | Waiting(n>0)| Tick                | Waiting(n-1)| Tick(n-1)      |
//! | Waiting(0)  | Tick                | Probing     | ProbeStarted   |
//! | Probing     | Outcome(Available)  | Alerted     | Alert(url)     |
//! | Probing     | Outcome(other)      | Waiting(N)  | Retry(outcome) |
//! | non-terminal| Cancel              | Stopped     | Stopped        |

use serde::Serialize;
use std::fmt;

use super::event::MonitorEvent;
use crate::config::MonitorConfig;
use crate::probe::ProbeOutcome;

/// Current phase of a monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MonitorState {
    /// Counting down to the next probe
    Waiting { remaining_secs: u64 },

    /// A probe is in flight; the countdown is suspended
    Probing,

    /// The target answered (terminal)
    Alerted { target_url: String },

    /// Cancelled from outside (terminal)
    Stopped,
}

/// Input to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// One second elapsed
    Tick,

    /// The outstanding probe resolved
    Outcome(ProbeOutcome),

    /// External cancellation
    Cancel,
}

/// Result of applying a trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: MonitorState,
    pub event: MonitorEvent,
}

impl Transition {
    fn new(next: MonitorState, event: MonitorEvent) -> Self {
        Self { next, event }
    }
}

impl MonitorState {
    /// Initial state for a freshly started monitor
    pub fn initial(config: &MonitorConfig) -> Self {
        Self::Waiting {
            remaining_secs: config.poll_interval_secs,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Alerted { .. } | Self::Stopped)
    }

    pub fn is_probing(&self) -> bool {
        matches!(self, Self::Probing)
    }

    /// Seconds left on the countdown, if counting
    pub fn remaining_secs(&self) -> Option<u64> {
        match self {
            Self::Waiting { remaining_secs } => Some(*remaining_secs),
            _ => None,
        }
    }

    /// Compute the transition for `trigger`
    ///
    /// Returns `None` when the trigger has no effect: any trigger in a
    /// terminal state, a tick while probing, or an outcome that arrives
    /// while not probing (a stale result).
    pub fn apply(&self, trigger: Trigger, config: &MonitorConfig) -> Option<Transition> {
        if self.is_terminal() {
            return None;
        }

        match (self, trigger) {
            (_, Trigger::Cancel) => Some(Transition::new(Self::Stopped, MonitorEvent::Stopped)),

            (Self::Waiting { remaining_secs: 0 }, Trigger::Tick) => {
                Some(Transition::new(Self::Probing, MonitorEvent::ProbeStarted))
            }

            (Self::Waiting { remaining_secs }, Trigger::Tick) => {
                let remaining_secs = remaining_secs - 1;
                Some(Transition::new(
                    Self::Waiting { remaining_secs },
                    MonitorEvent::Tick { remaining_secs },
                ))
            }

            (Self::Probing, Trigger::Outcome(ProbeOutcome::Available)) => {
                let target_url = config.target_url.trim().to_string();
                Some(Transition::new(
                    Self::Alerted {
                        target_url: target_url.clone(),
                    },
                    MonitorEvent::Alert { target_url },
                ))
            }

            (Self::Probing, Trigger::Outcome(outcome)) => Some(Transition::new(
                Self::initial(config),
                MonitorEvent::Retry { outcome },
            )),

            (Self::Probing, Trigger::Tick) | (Self::Waiting { .. }, Trigger::Outcome(_)) => None,

            (Self::Alerted { .. } | Self::Stopped, _) => None,
        }
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting { remaining_secs } => write!(f, "waiting ({remaining_secs}s)"),
            Self::Probing => write!(f, "probing"),
            Self::Alerted { target_url } => write!(f, "alerted ({target_url})"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}
