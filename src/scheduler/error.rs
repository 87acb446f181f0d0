//! Error types for the scheduler module

use std::fmt;

use crate::config::ConfigError;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug)]
pub enum SchedulerError {
    /// Configuration rejected before the run loop started
    InvalidConfig(ConfigError),

    /// `start` was called on a scheduler that already started
    AlreadyStarted,

    /// `start` was called outside a tokio runtime
    NoRuntime,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(err) => write!(f, "Invalid monitor configuration: {}", err),
            Self::AlreadyStarted => write!(f, "Monitor has already been started"),
            Self::NoRuntime => write!(f, "Monitor must be started from within a tokio runtime"),
        }
    }
}

impl std::error::Error for SchedulerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidConfig(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for SchedulerError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfig(err)
    }
}

impl SchedulerError {
    /// Check if retrying the same call could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoRuntime)
    }
}
