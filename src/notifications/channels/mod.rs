//! Sinks that render monitor events
//!
//! This module provides the [`EventSink`] trait and the built-in sinks.

pub mod console;
pub mod log;
pub mod webhook;

use async_trait::async_trait;

use crate::scheduler::MonitorEvent;

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors that can occur while delivering an event
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid sink configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Writing to a local output failed
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Consumer of monitor events
///
/// Implement this trait to render events somewhere new. Sinks are called
/// sequentially in emission order.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Get the sink name
    fn name(&self) -> &str;

    /// Render one event
    async fn deliver(&self, event: &MonitorEvent) -> SinkResult<()>;
}
