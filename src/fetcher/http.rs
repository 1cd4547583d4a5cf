//! reqwest-backed transport for the catalog API
//!
//! Provides:
//! - Bearer authentication and JSON content negotiation headers
//! - Per-request timeout from run configuration
//! - Retry with exponential backoff on network errors, 429 and 5xx
//!
//! Every other status, 403 and 404 included, is handed back untouched so the
//! record fetcher can classify it.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::shared_resources::global_http_client;
use super::{FetcherError, FetcherResult, Transport, TransportResponse};
use crate::config::{ConfigError, RunConfig};
use crate::extractor::config::calculate_backoff;
use crate::shutdown::SharedShutdown;

/// HTTP transport for the catalog API
pub struct HttpTransport {
    client: Arc<Client>,
    base_url: String,
    headers: HeaderMap,
    timeout: Duration,
    max_retries: u32,
    shutdown: Option<SharedShutdown>,
}

impl HttpTransport {
    /// Create a transport
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client
    /// * `base_url` - API base URL, resource paths are appended to it
    /// * `api_key` - Bearer token
    /// * `timeout` - Per-request timeout
    /// * `max_retries` - Retry budget for retryable failures
    pub fn new(
        client: Arc<Client>,
        base_url: impl Into<String>,
        api_key: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headers: auth_headers(api_key)?,
            timeout,
            max_retries,
            shutdown: None,
        })
    }

    /// Build a transport from validated run configuration
    pub fn from_config(config: &RunConfig) -> Result<Self, ConfigError> {
        Self::new(
            global_http_client(),
            config.api_base_url()?,
            config.api_key()?,
            config.request_timeout(),
            config.max_retries(),
        )
    }

    /// Abort backoff sleeps when shutdown is requested
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Sleep before the next attempt; `false` when shutdown cut the wait short
    async fn backoff(&self, attempt: u32) -> bool {
        let delay = calculate_backoff(attempt);
        debug!(backoff_ms = delay.as_millis() as u64, "Retrying after backoff");
        match &self.shutdown {
            Some(shutdown) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = shutdown.wait_for_shutdown() => false,
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> FetcherResult<TransportResponse> {
        let url = self.url(path);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            let sent = self
                .client
                .get(&url)
                .headers(self.headers.clone())
                .query(query)
                .timeout(self.timeout)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        max_attempts = self.max_retries + 1,
                        "Network error: {}",
                        e
                    );
                    last_error = Some(FetcherError::NetworkError(e.to_string()));
                    if attempt < self.max_retries && self.backoff(attempt).await {
                        continue;
                    }
                    break;
                }
            };

            let status = response.status();
            if is_retryable(status) && attempt < self.max_retries {
                warn!(
                    url = %url,
                    status = status.as_u16(),
                    attempt = attempt + 1,
                    max_attempts = self.max_retries + 1,
                    "Retryable status"
                );
                if self.backoff(attempt).await {
                    continue;
                }
            }

            if let Some(error) = exhausted_status(status) {
                warn!(url = %url, status = status.as_u16(), "Retries exhausted");
                return Err(error);
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| FetcherError::HttpError(format!("Failed to read body: {e}")))?;

            debug!(url = %url, status = status.as_u16(), bytes = body.len(), "Response received");
            return Ok(TransportResponse {
                status: status.as_u16(),
                body,
            });
        }

        Err(last_error
            .unwrap_or_else(|| FetcherError::NetworkError("All retries exhausted".to_string())))
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Error for a retryable status still returned once the retry budget is spent.
/// 5xx is handed back so the record fetcher reports the status itself.
fn exhausted_status(status: StatusCode) -> Option<FetcherError> {
    (status == StatusCode::TOO_MANY_REQUESTS).then_some(FetcherError::RateLimitExceeded)
}

fn auth_headers(api_key: &str) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
        ConfigError::InvalidValue {
            field: "api_key",
            message: "contains characters not allowed in an HTTP header".to_string(),
        }
    })?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);

    Ok(headers)
}
