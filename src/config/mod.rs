//! Configuration management for siteprobe
//!
//! This module handles loading and validating configuration from a TOML file
//! and environment variables. Command-line flags are applied on top by the
//! binary.
//!
//! ```toml
//! [monitor]
//! target_url = "https://example.com/"
//! probe_timeout_ms = 5000
//!
//! [logging]
//! level = "info"
//! format = "text"
//!
//! [notifications]
//! console = true
//! webhook_url = "https://hooks.example.com/siteprobe"
//! webhook_token = "s3cret"
//! webhook_retries = 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::probe::http::default_user_agent;

/// Seconds between probes when nothing else is configured
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Probe deadline in milliseconds when nothing else is configured
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5000;

/// Extra webhook attempts after the first failure
pub const DEFAULT_WEBHOOK_RETRIES: u32 = 3;

/// Per-request webhook deadline in seconds
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Target URL missing
    #[error("target_url must not be empty")]
    EmptyUrl,

    /// Target URL could not be parsed
    #[error("invalid target_url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Target URL uses something other than http/https
    #[error("unsupported scheme '{scheme}' in target_url (expected http or https)")]
    UnsupportedScheme { scheme: String },

    /// Poll interval below one second
    #[error("poll_interval_secs must be at least 1 (got {0})")]
    InvalidPollInterval(u64),

    /// Probe timeout below one millisecond
    #[error("probe_timeout_ms must be at least 1 (got {0})")]
    InvalidProbeTimeout(u64),

    /// Unknown log format
    #[error("unknown log format '{0}' (expected text or json)")]
    InvalidLogFormat(String),

    /// Webhook URL present but unusable
    #[error("invalid webhook_url: {0}")]
    InvalidWebhookUrl(#[source] Box<ConfigError>),

    /// Webhook request timeout of zero
    #[error("webhook_timeout_secs must be at least 1")]
    InvalidWebhookTimeout,

    /// Environment variable set to something unusable
    #[error("invalid value '{value}' in {var}")]
    InvalidEnv { var: &'static str, value: String },

    /// Config file could not be read
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Config could not be rendered back to TOML
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// What to watch and how often
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where events are rendered
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Monitor configuration, fixed once the scheduler starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Absolute http(s) URL to probe
    #[serde(default)]
    pub target_url: String,

    /// Countdown length between probes, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Deadline for a single probe, in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// User agent sent with probes
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Render countdown and alert on stdout
    #[serde(default = "default_true")]
    pub console: bool,

    /// Optional webhook receiving the alert
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Bearer token sent with webhook requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_token: Option<String>,

    /// Extra attempts after a failed webhook request
    #[serde(default = "default_webhook_retries")]
    pub webhook_retries: u32,

    /// Per-request webhook deadline, in seconds
    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,
}

/// Parse an absolute http(s) URL
///
/// Shared by the target and webhook checks so both accept the same inputs.
pub fn parse_http_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::EmptyUrl);
    }

    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("text")
}

fn default_true() -> bool {
    true
}

fn default_webhook_retries() -> u32 {
    DEFAULT_WEBHOOK_RETRIES
}

fn default_webhook_timeout_secs() -> u64 {
    DEFAULT_WEBHOOK_TIMEOUT_SECS
}

impl MonitorConfig {
    /// Create a config for `target_url` with default timings
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            ..Default::default()
        }
    }

    /// Override the countdown length
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Override the probe deadline
    pub fn with_probe_timeout_ms(mut self, millis: u64) -> Self {
        self.probe_timeout_ms = millis;
        self
    }

    /// Override the probe User-Agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Parse and check the target URL
    pub fn target(&self) -> Result<Url, ConfigError> {
        parse_http_url(&self.target_url)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target()?;

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval(self.poll_interval_secs));
        }

        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::InvalidProbeTimeout(self.probe_timeout_ms));
        }

        Ok(())
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            console: true,
            webhook_url: None,
            webhook_token: None,
            webhook_retries: DEFAULT_WEBHOOK_RETRIES,
            webhook_timeout_secs: DEFAULT_WEBHOOK_TIMEOUT_SECS,
        }
    }
}

impl NotificationConfig {
    /// Parsed webhook URL, if one is configured
    pub fn webhook_target(&self) -> Result<Option<Url>, ConfigError> {
        self.webhook_url
            .as_deref()
            .map(|raw| parse_http_url(raw).map_err(|e| ConfigError::InvalidWebhookUrl(Box::new(e))))
            .transpose()
    }

    /// Validate webhook settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.webhook_target()?;

        if self.webhook_timeout_secs == 0 {
            return Err(ConfigError::InvalidWebhookTimeout);
        }

        Ok(())
    }

    #[must_use]
    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }
}

/// Read a numeric environment variable; unset means `None`
fn env_number<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from a file, then apply environment overrides
    ///
    /// Without a path the defaults are used as the base.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override values from `SITEPROBE_*` environment variables
    ///
    /// Runs before logging is set up, so a malformed number is returned as
    /// [`ConfigError::InvalidEnv`] rather than logged.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("SITEPROBE_TARGET_URL") {
            self.monitor.target_url = url;
        }

        if let Some(millis) = env_number("SITEPROBE_PROBE_TIMEOUT_MS")? {
            self.monitor.probe_timeout_ms = millis;
        }

        if let Ok(user_agent) = std::env::var("SITEPROBE_USER_AGENT") {
            self.monitor.user_agent = user_agent;
        }

        if let Ok(level) = std::env::var("SITEPROBE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("SITEPROBE_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(webhook) = std::env::var("SITEPROBE_WEBHOOK_URL") {
            self.notifications.webhook_url = Some(webhook).filter(|w| !w.is_empty());
        }

        if let Ok(token) = std::env::var("SITEPROBE_WEBHOOK_TOKEN") {
            self.notifications.webhook_token = Some(token).filter(|t| !t.is_empty());
        }

        if let Some(retries) = env_number("SITEPROBE_WEBHOOK_RETRIES")? {
            self.notifications.webhook_retries = retries;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monitor.validate()?;

        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        }

        self.notifications.validate()?;

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
