//! HTTP transport with pooled connections, timeouts and retry

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, Method, StatusCode};

use super::rate_limit::ReactiveRateLimiter;
use super::retry::RetryPolicy;
use crate::error::TransportError;

/// Idle connections kept per host
const POOL_MAX_IDLE_PER_HOST: usize = 16;

/// Upper bound on error bodies carried in messages
const MAX_ERROR_BODY: usize = 200;

/// API credentials, sent with every request
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Timeout, retry and throttling settings
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub requests_per_second: u32,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            requests_per_second: 6,
        }
    }
}

/// One outbound call, relative to the transport's base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
        }
    }
}

/// A failed attempt plus the server's requested backoff, if any
struct AttemptFailure {
    error: TransportError,
    retry_after: Option<Duration>,
}

impl From<TransportError> for AttemptFailure {
    fn from(error: TransportError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

/// Pooled HTTP transport.
///
/// Cheap to share behind an `Arc`; the underlying `reqwest::Client` and rate
/// limiter are safe for concurrent use.
pub struct Transport {
    http: HttpClient,
    base_url: String,
    credentials: Credentials,
    settings: TransportSettings,
    rate_limiter: Arc<ReactiveRateLimiter>,
}

impl Transport {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        settings: TransportSettings,
    ) -> Result<Self, TransportError> {
        let http = HttpClient::builder()
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(settings.timeout)
            .user_agent(concat!("hnmon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(ReactiveRateLimiter::new(settings.requests_per_second)),
            credentials,
            settings,
        })
    }

    #[cfg(test)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a 429 has switched on throttling for this transport
    #[cfg(test)]
    pub fn is_throttled(&self) -> bool {
        self.rate_limiter.is_active()
    }

    /// Execute a request, retrying transient failures, and return the body.
    pub async fn execute(&self, request: &ApiRequest) -> Result<String, TransportError> {
        let policy = &self.settings.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.rate_limiter.wait_if_active().await;

            let failure = match self.send_once(request).await {
                Ok(body) => return Ok(body),
                Err(failure) => failure,
            };

            if !failure.error.is_retriable() {
                return Err(failure.error);
            }
            if !policy.should_retry(attempt) {
                return Err(TransportError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(failure.error),
                });
            }

            let mut delay = policy.delay_for(attempt);
            if let Some(retry_after) = failure.retry_after {
                delay = delay.max(retry_after.min(policy.max_delay));
            }
            debug!(
                "Retrying {} {} in {:?} (attempt {}/{}): {}",
                request.method, request.path, delay, attempt, policy.max_attempts, failure.error
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<String, AttemptFailure> {
        let url = format!("{}{}", self.base_url, request.path);
        let response = self
            .http
            .request(request.method.clone(), &url)
            .timeout(self.settings.timeout)
            .header("x-client-id", &self.credentials.client_id)
            .header("x-client-secret", &self.credentials.client_secret)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status.is_success() {
            return response
                .text()
                .await
                .map_err(|e| AttemptFailure::from(self.classify(e)));
        }

        let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
            self.rate_limiter.activate();
            response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
        } else {
            None
        };

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Unexpected status")
                .to_string()
        } else {
            body.chars().take(MAX_ERROR_BODY).collect()
        };

        Err(AttemptFailure {
            error: TransportError::HttpError {
                status: status.as_u16(),
                message,
            },
            retry_after,
        })
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.settings.timeout)
        } else {
            TransportError::from(err)
        }
    }
}
