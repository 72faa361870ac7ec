use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Immutable client settings, consumed at [`Client`](crate::client::Client)
/// construction. Library consumers can build the value directly; binary
/// consumers can use [`ClientConfig::load`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the service; endpoint paths are joined onto it.
    pub base_url: String,
    /// Rows requested per page when paginating a table.
    pub page_size: usize,
    /// Hard bound on pages fetched for one table; guards against a server
    /// that never returns a short page.
    pub page_ceiling: usize,
    /// Maximum in-flight HTTP requests across all concurrent table fetches.
    pub max_concurrent_requests: usize,
    /// Timeout for a single HTTP attempt, in seconds.
    pub attempt_timeout_secs: u64,
    /// Deadline for one page request including all retries, in seconds.
    /// Each page request gets a fresh deadline.
    pub request_deadline_secs: u64,
    pub retry: RetryStrategy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Loads settings from the embedded defaults merged with `QUAY__`
    /// prefixed environment variables (e.g. `QUAY__PAGE_SIZE=50`).
    pub fn load() -> ClientResult<Self> {
        Figment::from(Toml::string(DEFAULT_CONFIG))
            .admerge(Env::prefixed("QUAY__").map(|p| p.as_str().replace("__", ".").into()))
            .extract()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))
    }

    pub(crate) fn validate(&self) -> ClientResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::invalid_config("base_url must not be empty"));
        }
        if self.page_size == 0 {
            return Err(ClientError::invalid_config("page_size must be at least 1"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ClientError::invalid_config(
                "max_concurrent_requests must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            page_size: 100,
            page_ceiling: 10_000,
            max_concurrent_requests: 4,
            attempt_timeout_secs: 10,
            request_deadline_secs: 30,
            retry: RetryStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RetryStrategy {
    Fixed(FixedRetryStrategy),
    ExponentialBackoff(ExponentialBackoffRetryStrategy),
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::ExponentialBackoff(ExponentialBackoffRetryStrategy {
            max_count: 3,
            initial_delay_secs: 1,
            max_delay_secs: 10,
            factor: 2,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedRetryStrategy {
    pub max_count: usize,
    pub delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExponentialBackoffRetryStrategy {
    pub max_count: usize,
    pub initial_delay_secs: u64,
    pub max_delay_secs: u64,
    pub factor: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let config: ClientConfig = Figment::from(Toml::string(DEFAULT_CONFIG))
            .extract()
            .unwrap();
        assert_eq!(config.page_size, 100);
        assert_eq!(config.page_ceiling, 10_000);
        assert!(matches!(
            config.retry,
            RetryStrategy::ExponentialBackoff(_)
        ));
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let config = ClientConfig {
            page_size: 0,
            ..ClientConfig::new("https://example.com")
        };
        assert!(matches!(
            config.validate(),
            Err(ClientError::InvalidConfig(_))
        ));
    }
}
