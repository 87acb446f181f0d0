//! Reachability probes
//!
//! A probe is a single bounded-duration check against the target URL. Every
//! probe resolves to a [`ProbeOutcome`]; transport errors are folded into
//! [`ProbeOutcome::Unavailable`] and an expired deadline into
//! [`ProbeOutcome::TimedOut`]. Retry policy belongs to the scheduler, never to
//! the prober.
//!
//! # Example
//!
//! ```no_run
//! use siteprobe::probe::{HttpProber, Prober};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let prober = HttpProber::new()?;
//! let url = url::Url::parse("https://example.com/")?;
//! let outcome = prober.probe(&url, Duration::from_secs(5)).await;
//! println!("{url}: {outcome}");
//! # Ok(())
//! # }
//! ```

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

pub use http::HttpProber;

/// Lowest status code counted as available
pub const AVAILABLE_STATUS_MIN: u16 = 200;

/// Highest status code counted as available (redirects included)
pub const AVAILABLE_STATUS_MAX: u16 = 399;

/// Classification of a completed probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// A response with a success or redirect status arrived in time
    Available,
    /// Any other status, or a transport failure before the deadline
    Unavailable,
    /// No determination was reached before the deadline
    TimedOut,
}

impl ProbeOutcome {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::TimedOut => "timed_out",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify an HTTP status code
pub fn classify_status(status: u16) -> ProbeOutcome {
    if (AVAILABLE_STATUS_MIN..=AVAILABLE_STATUS_MAX).contains(&status) {
        ProbeOutcome::Available
    } else {
        ProbeOutcome::Unavailable
    }
}

/// Performs exactly one reachability check
///
/// Implementations must resolve within `timeout` (plus scheduling slack) and
/// must never panic or hang; the scheduler additionally enforces its own
/// deadline around every call.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Check `url` once and classify the result
    async fn probe(&self, url: &Url, timeout: Duration) -> ProbeOutcome;
}
