//! Client Settings
//!
//! Everything a client needs to reach the API: credentials, endpoint, timeouts
//! and retry policy.

use crate::error::{OaiError, Result};
use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Client configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API key; when unset it is read from `api_key_env`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Sent as `OpenAI-Organization`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// API root; any query string (e.g. `?api-version=...`) is kept on every request
    pub base_url: String,

    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    pub connect_timeout_secs: u64,

    pub pool_max_idle_per_host: usize,

    /// Bytes requested per read of a streamed body
    pub stream_buffer_size: usize,

    /// Additional headers sent with every request
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            organization: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 300,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 10,
            stream_buffer_size: crate::stream::pump::DEFAULT_BUFFER_SIZE,
            headers: HashMap::new(),
            retry: RetryConfig::default(),
        }
    }
}

// The API key is redacted.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("organization", &self.organization)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("stream_buffer_size", &self.stream_buffer_size)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("retry", &self.retry)
            .finish()
    }
}

impl ClientConfig {
    /// Default settings with an explicit key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// The configured key, or the one in `api_key_env`.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }

        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                OaiError::Config(format!(
                    "No API key configured and {} is not set",
                    self.api_key_env
                ))
            })
    }

    /// Reject settings no client can run with.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(OaiError::Config("base_url must not be empty".to_string()));
        }
        if self.stream_buffer_size == 0 {
            return Err(OaiError::Config(
                "stream_buffer_size must be greater than zero".to_string(),
            ));
        }
        self.resolve_api_key().map(|_| ())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Retry policy for non-streaming requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,

    pub initial_interval_ms: u64,

    pub max_interval_ms: u64,

    /// Give up once this much time has passed, whatever `max_retries` says
    pub max_elapsed_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_interval_ms: 500,
            max_interval_ms: 30_000,
            max_elapsed_ms: 120_000,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Exponential backoff schedule for this policy
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(self.initial_interval_ms),
            current_interval: Duration::from_millis(self.initial_interval_ms),
            max_interval: Duration::from_millis(self.max_interval_ms),
            max_elapsed_time: Some(Duration::from_millis(self.max_elapsed_ms)),
            multiplier: 2.0,
            ..Default::default()
        }
    }
}
