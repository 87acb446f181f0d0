//! Unified error handling for the siteprobe crate
//!
//! Each module keeps its own error type; this module wraps them in a single
//! [`Error`] enum for callers that cross module boundaries. The binary's
//! commands return [`Result`] and turn the category into an exit status.
//!
//! Probe failures are deliberately absent: a probe never fails, it resolves
//! to a [`ProbeOutcome`](crate::probe::ProbeOutcome).

use std::io;
use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::notifications::SinkError;
pub use crate::scheduler::SchedulerError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP client, webhook delivery)
    Network,
    /// Configuration and validation errors
    Config,
    /// Scheduler lifecycle errors
    Scheduler,
    /// Local I/O errors
    Io,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Config => "config",
            Self::Scheduler => "scheduler",
            Self::Io => "io",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the siteprobe crate
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Scheduler start-up errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Sink(#[from] SinkError),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Sink(e) => !matches!(e, SinkError::InvalidConfig(_)),
            Self::Http(_) => true,
            Self::Io(_) => true,
            Self::Other { .. } => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Config,
            Self::Scheduler(SchedulerError::InvalidConfig(_)) => ErrorCategory::Config,
            Self::Scheduler(_) => ErrorCategory::Scheduler,
            Self::Sink(SinkError::InvalidConfig(_)) => ErrorCategory::Config,
            Self::Sink(SinkError::Io(_)) => ErrorCategory::Io,
            Self::Sink(_) | Self::Http(_) => ErrorCategory::Network,
            Self::Io(_) => ErrorCategory::Io,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }

    /// Process exit status for a command that failed with this error
    ///
    /// Configuration problems exit with 2 so scripts can tell them apart
    /// from runtime failures, which exit with 1.
    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::Config => 2,
            _ => 1,
        }
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
