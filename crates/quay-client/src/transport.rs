use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use thiserror::Error;
use tokio::sync::Semaphore;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{TransportError, TransportResult};
use crate::retry::{jittered, RetryStrategy};

/// Outcome of one HTTP attempt at the socket boundary.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Failure of one HTTP attempt, before any status classification.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("attempt timed out")]
    Timeout,
}

/// The socket/HTTP boundary. The transport core owns retries, deadlines and
/// error classification; implementations of this trait own the actual I/O.
#[async_trait]
pub trait HttpSend: Send + Sync {
    async fn send(
        &self,
        url: Url,
        params: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError>;
}

/// Production [`HttpSend`] backed by a pooled reqwest client.
#[derive(Debug, Default)]
pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpSend for ReqwestHttp {
    async fn send(
        &self,
        url: Url,
        params: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout
                } else {
                    HttpError::Connection(e.to_string())
                }
            })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::Connection(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

/// Issues page requests with bounded concurrency, a fresh per-request
/// deadline, and retry/backoff on transient failures.
///
/// Retryable: connect errors, attempt timeouts, HTTP 5xx and 429.
/// Any other 4xx is a client error and fails immediately.
pub(crate) struct Transport {
    http: Arc<dyn HttpSend>,
    base_url: Url,
    retry: RetryStrategy,
    attempt_timeout: Duration,
    request_deadline: Duration,
    semaphore: Arc<Semaphore>,
}

impl Transport {
    pub fn new(config: &ClientConfig, http: Arc<dyn HttpSend>) -> TransportResult<Self> {
        let base_url =
            Url::parse(&config.base_url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            retry: RetryStrategy::from(&config.retry),
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
            request_deadline: Duration::from_secs(config.request_deadline_secs),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_requests)),
        })
    }

    /// Issues one page request and returns the raw response body.
    /// Retries happen inside; callers only observe the final outcome.
    pub async fn send(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> TransportResult<String> {
        let url = self.endpoint_url(endpoint)?;
        match tokio::time::timeout(self.request_deadline, self.send_with_retries(url, params)).await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> TransportResult<Url> {
        // The service addresses query endpoints as `<path>.json`.
        let joined = format!(
            "{}/{}.json",
            self.base_url.as_str().trim_end_matches('/'),
            endpoint.trim_matches('/')
        );
        Url::parse(&joined).map_err(|e| TransportError::InvalidUrl(e.to_string()))
    }

    async fn send_with_retries(
        &self,
        url: Url,
        params: &[(String, String)],
    ) -> TransportResult<String> {
        let mut delays = self.retry.delays();
        let mut attempts = 0usize;
        loop {
            attempts += 1;
            let outcome = self.attempt(url.clone(), params).await;
            let failure = match outcome {
                Ok(response) if (200..300).contains(&response.status) => {
                    debug!("request to {url} succeeded after {attempts} attempt(s)");
                    return Ok(response.body);
                }
                Ok(response) if response.status == 429 || response.status >= 500 => {
                    format!("server responded with status {}", response.status)
                }
                Ok(response) => {
                    return Err(TransportError::ClientError {
                        status: response.status,
                    })
                }
                Err(e) => e.to_string(),
            };
            match delays.next() {
                Some(delay) => {
                    warn!("transient failure for {url} ({failure}), retrying");
                    tokio::time::sleep(jittered(delay)).await;
                }
                None => {
                    return Err(TransportError::Exhausted {
                        attempts,
                        last: failure,
                    })
                }
            }
        }
    }

    async fn attempt(
        &self,
        url: Url,
        params: &[(String, String)],
    ) -> Result<HttpResponse, HttpError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| HttpError::Connection(e.to_string()))?;
        self.http.send(url, params, self.attempt_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base_url: &str) -> TransportResult<Transport> {
        let config = ClientConfig::new(base_url);
        Transport::new(&config, Arc::new(ReqwestHttp::new()))
    }

    #[test]
    fn test_endpoint_url_appends_json_suffix() {
        let transport = transport("https://iss.example.com/").unwrap();
        let url = transport
            .endpoint_url("iss/engines/stock/markets/shares/securities")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://iss.example.com/iss/engines/stock/markets/shares/securities.json"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(
            transport("not a url"),
            Err(TransportError::InvalidUrl(_))
        ));
    }
}
