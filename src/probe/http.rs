//! HTTP reachability probe
//!
//! Sends a header-only `HEAD` request and classifies the response status.
//! Redirects are not followed: a 3xx answer already proves the server is up.

use async_trait::async_trait;
use reqwest::{header::USER_AGENT, redirect, Client};
use std::time::Duration;
use url::Url;

use super::{classify_status, ProbeOutcome, Prober};

/// Default User-Agent sent with every probe
pub fn default_user_agent() -> String {
    format!("siteprobe/{}", env!("CARGO_PKG_VERSION"))
}

/// Prober backed by a reusable reqwest client
#[derive(Debug, Clone)]
pub struct HttpProber {
    /// HTTP client with redirects disabled
    client: Client,

    /// User-Agent header value
    user_agent: String,
}

impl HttpProber {
    /// Create a prober with the default User-Agent
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be created
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_user_agent(default_user_agent())
    }

    /// Create a prober sending a custom User-Agent
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be created
    pub fn with_user_agent(user_agent: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn send_head(&self, url: &Url, timeout: Duration) -> ProbeOutcome {
        let request = self
            .client
            .head(url.clone())
            .header(USER_AGENT, &self.user_agent)
            .timeout(timeout);

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let outcome = classify_status(status);
                tracing::debug!(url = %url, status, outcome = %outcome, "Probe response received");
                outcome
            }
            Err(e) if e.is_timeout() => {
                tracing::debug!(url = %url, "Probe request timed out");
                ProbeOutcome::TimedOut
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Probe transport failure");
                ProbeOutcome::Unavailable
            }
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &Url, timeout: Duration) -> ProbeOutcome {
        // Dropping the request future on expiry abandons the connection.
        match tokio::time::timeout(timeout, self.send_head(url, timeout)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "Probe deadline elapsed");
                ProbeOutcome::TimedOut
            }
        }
    }
}
