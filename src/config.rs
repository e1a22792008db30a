//! Client configuration: service location and transport timeouts

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Public keyvalue.xyz API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.keyvalue.xyz";

/// Configuration options for the keyvalue client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service base URL, requests are issued below it (default: https://api.keyvalue.xyz)
    pub base_url: String,
    /// TCP connect timeout in milliseconds (default: 10000)
    pub connect_timeout_ms: u64,
    /// Time allowed for TLS handshake, response headers and body (default: 10000)
    pub response_timeout_ms: u64,
    /// TCP keepalive interval in milliseconds (default: 300000)
    pub keepalive_ms: u64,
    /// How long an idle pooled connection is kept open (default: 90000)
    pub pool_idle_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_ms: 10_000,
            response_timeout_ms: 10_000,
            keepalive_ms: 300_000,
            pool_idle_timeout_ms: 90_000,
        }
    }
}

impl ClientConfig {
    /// Config pointing at `base_url` with default timeouts
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    /// Load configuration from `KEYVALUE_*` environment variables.
    ///
    /// Unset variables fall back to the defaults; a set but unparsable
    /// number is an error.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let base_url = env::var("KEYVALUE_BASE_URL").unwrap_or(defaults.base_url);
        let connect_timeout_ms =
            parse_millis("KEYVALUE_CONNECT_TIMEOUT_MS")?.unwrap_or(defaults.connect_timeout_ms);
        let response_timeout_ms =
            parse_millis("KEYVALUE_RESPONSE_TIMEOUT_MS")?.unwrap_or(defaults.response_timeout_ms);
        let keepalive_ms =
            parse_millis("KEYVALUE_KEEPALIVE_MS")?.unwrap_or(defaults.keepalive_ms);
        let pool_idle_timeout_ms =
            parse_millis("KEYVALUE_POOL_IDLE_TIMEOUT_MS")?.unwrap_or(defaults.pool_idle_timeout_ms);

        Ok(ClientConfig {
            base_url,
            connect_timeout_ms,
            response_timeout_ms,
            keepalive_ms,
            pool_idle_timeout_ms,
        })
    }

    pub(crate) fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub(crate) fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub(crate) fn keepalive(&self) -> Duration {
        Duration::from_millis(self.keepalive_ms)
    }

    pub(crate) fn pool_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_idle_timeout_ms)
    }
}

fn parse_millis(var: &str) -> Result<Option<u64>> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{} must be a number of milliseconds: {}", var, e))),
        Err(_) => Ok(None),
    }
}
