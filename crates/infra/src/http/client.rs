//! Shared transport for the identity provider and SharePoint REST calls

use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use tenderdocs_domain::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use tenderdocs_domain::{DocSyncError, HttpConfig};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// reqwest client with a per-request timeout and an attempt budget.
///
/// With the default budget of one attempt every response is returned as
/// received. A larger budget re-sends the request after throttling (429),
/// a 5xx status or a connect/timeout failure, doubling the pause each time.
#[derive(Clone)]
pub struct HttpClient {
    inner: ReqwestClient,
    attempts: usize,
    pause: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Single-attempt client with the default timeout.
    pub fn new() -> Result<Self, DocSyncError> {
        Self::builder().build()
    }

    /// Timeout and attempt budget from the `http` config section.
    pub fn from_config(config: &HttpConfig) -> Result<Self, DocSyncError> {
        Self::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .max_attempts(config.max_attempts)
            .build()
    }

    /// Same timeout as `from_config`, but never re-sends a request.
    pub fn single_attempt(config: &HttpConfig) -> Result<Self, DocSyncError> {
        Self::builder().timeout(Duration::from_secs(config.timeout_secs)).build()
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.inner.request(method, url)
    }

    /// Send `builder`, re-sending it on transient failures while the attempt
    /// budget lasts. The last response is returned whatever its status.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, DocSyncError> {
        let mut attempt = 1;
        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| DocSyncError::Internal("streaming request bodies cannot be re-sent".into()))?
                .build()
                .map_err(|e| DocSyncError::from(InfraError::from(e)))?;
            let method = request.method().clone();
            let path = request.url().path().to_string();
            let final_attempt = attempt >= self.attempts;

            match self.inner.execute(request).await {
                Ok(response) if !final_attempt && is_transient_status(response.status()) => {
                    warn!(attempt, %method, path, status = %response.status(), "transient status, re-sending");
                }
                Ok(response) => {
                    debug!(attempt, %method, path, status = %response.status(), "response received");
                    return Ok(response);
                }
                Err(err) if !final_attempt && is_transient_transport(&err) => {
                    warn!(attempt, %method, path, error = %err, "transport failure, re-sending");
                }
                Err(err) => return Err(InfraError::from(err).into()),
            }

            tokio::time::sleep(self.pause_after(attempt)).await;
            attempt += 1;
        }
    }

    fn pause_after(&self, attempt: usize) -> Duration {
        let doublings = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(6);
        self.pause.saturating_mul(1 << doublings)
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_transient_transport(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    attempts: usize,
    pause: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            attempts: 1,
            pause: Duration::from_millis(200),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts per request, first try included. Zero is read as one.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Pause before the first re-send; later pauses double.
    pub fn base_backoff(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn build(self) -> Result<HttpClient, DocSyncError> {
        let inner = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(concat!("tenderdocs/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .map_err(|e| DocSyncError::from(InfraError::from(e)))?;

        Ok(HttpClient { inner, attempts: self.attempts, pause: self.pause })
    }
}
