//! Webhook sink
//!
//! Posts a JSON payload when the target becomes available. Countdown and
//! retry events are not forwarded.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::{EventSink, SinkError, SinkResult};
use crate::config::{
    parse_http_url, NotificationConfig, DEFAULT_WEBHOOK_RETRIES, DEFAULT_WEBHOOK_TIMEOUT_SECS,
};
use crate::notifications::AlertNotice;
use crate::scheduler::MonitorEvent;

/// How one failed request should be handled
enum Attempt {
    /// Worth sending again (transport failure, 5xx)
    Retry(SinkError),
    /// Resending cannot help (4xx)
    GiveUp(SinkError),
}

/// Webhook sink
///
/// # Payload Format
///
/// ```json
/// {
///   "event": "alert",
///   "target_url": "https://example.com/",
///   "message": "https://example.com/ is available",
///   "alerted_at": "2024-01-01T12:05:00+00:00"
/// }
/// ```
///
/// Failed requests are resent up to `max_retries` times, waiting
/// `base_delay`, then twice as long before each further attempt. Client
/// errors are returned at once.
pub struct WebhookSink {
    url: Url,
    client: Client,
    auth_token: Option<String>,
    timeout: Duration,
    max_retries: u32,
    base_delay: Duration,
}

impl WebhookSink {
    /// Create a sink posting to `url` with default retry settings
    ///
    /// # Errors
    ///
    /// [`SinkError::InvalidConfig`] unless `url` is an absolute http(s) URL
    pub fn new(url: &str) -> SinkResult<Self> {
        let url = parse_http_url(url).map_err(|e| SinkError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            url,
            client: Client::builder().build()?,
            auth_token: None,
            timeout: Duration::from_secs(DEFAULT_WEBHOOK_TIMEOUT_SECS),
            max_retries: DEFAULT_WEBHOOK_RETRIES,
            base_delay: Duration::from_secs(1),
        })
    }

    /// Build the sink described by `[notifications]`, if a webhook is set
    pub fn from_config(config: &NotificationConfig) -> SinkResult<Option<Self>> {
        let Some(url) = config.webhook_url.as_deref() else {
            return Ok(None);
        };

        let mut sink = Self::new(url)?
            .with_max_retries(config.webhook_retries)
            .with_timeout(config.webhook_timeout());
        if let Some(token) = &config.webhook_token {
            sink = sink.with_auth_token(token.clone());
        }
        Ok(Some(sink))
    }

    /// Send `token` as a bearer credential
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the first retry delay (doubles on every attempt)
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn has_auth_token(&self) -> bool {
        self.auth_token.is_some()
    }

    fn payload(notice: &AlertNotice) -> serde_json::Value {
        serde_json::json!({
            "event": "alert",
            "target_url": notice.target_url,
            "message": notice.message,
            "alerted_at": notice.alerted_at.to_rfc3339(),
        })
    }

    async fn post(&self, payload: &serde_json::Value) -> Result<(), Attempt> {
        let mut request = self
            .client
            .post(self.url.clone())
            .timeout(self.timeout)
            .json(payload);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Attempt::Retry(SinkError::HttpError(e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let error = SinkError::Status {
            status: status.as_u16(),
            body,
        };
        if status.is_client_error() {
            Err(Attempt::GiveUp(error))
        } else {
            Err(Attempt::Retry(error))
        }
    }

    async fn post_with_backoff(&self, payload: &serde_json::Value) -> SinkResult<()> {
        let mut delay = self.base_delay;
        let mut retries = 0;

        loop {
            match self.post(payload).await {
                Ok(()) => {
                    tracing::info!(url = %self.url, retries, "Webhook delivered");
                    return Ok(());
                }
                Err(Attempt::GiveUp(error)) => return Err(error),
                Err(Attempt::Retry(error)) if retries >= self.max_retries => return Err(error),
                Err(Attempt::Retry(error)) => {
                    retries += 1;
                    tracing::warn!(
                        url = %self.url,
                        retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Webhook delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, event: &MonitorEvent) -> SinkResult<()> {
        match AlertNotice::from_event(event) {
            Some(notice) => self.post_with_backoff(&Self::payload(&notice)).await,
            None => Ok(()),
        }
    }
}
