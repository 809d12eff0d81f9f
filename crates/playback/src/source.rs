//! Frame sources: where manifests and payload bytes come from.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::PlaybackConfig;
use crate::error::FetchError;

/// Fetches raw bytes by opaque reference.
///
/// Implemented by the host. Transport details such as proxies, auth and
/// CORS are the implementation's concern.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn fetch(&self, reference: &str) -> Result<Bytes, FetchError>;
}

#[async_trait]
impl<S: FrameSource + ?Sized> FrameSource for Arc<S> {
    async fn fetch(&self, reference: &str) -> Result<Bytes, FetchError> {
        (**self).fetch(reference).await
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// Fetches references over HTTP(S).
///
/// Relative references are joined onto the base URL; absolute ones are
/// used as given.
#[derive(Debug, Clone)]
pub struct HttpFrameSource {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpFrameSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| FetchError::Transport {
                url: base_url.clone(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn from_config(config: &PlaybackConfig) -> Result<Self, FetchError> {
        Self::new(config.base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a reference to the URL that will be requested.
    pub fn resolve(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            reference.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl FrameSource for HttpFrameSource {
    #[instrument(skip(self), fields(url = tracing::field::Empty))]
    async fn fetch(&self, reference: &str) -> Result<Bytes, FetchError> {
        let url = self.resolve(reference);
        tracing::Span::current().record("url", url.as_str());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.transport_error(&url, e))?;
        debug!(bytes = bytes.len(), "Fetched");
        Ok(bytes)
    }
}

impl HttpFrameSource {
    fn transport_error(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            return FetchError::Timeout(self.timeout);
        }
        FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Retry
// ============================================================================

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Bound on each attempt. An attempt that runs over fails with
    /// [`FetchError::Timeout`] and is retried like any other timeout.
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            attempt_timeout: None,
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: config.initial_retry_delay(),
            max_delay: config.max_retry_delay(),
            attempt_timeout: Some(config.request_timeout()),
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default())
    }
}

/// Retries retryable failures of an inner source.
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: FrameSource> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    async fn attempt(&self, reference: &str) -> Result<Bytes, FetchError> {
        match self.policy.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, self.inner.fetch(reference))
                .await
                .unwrap_or(Err(FetchError::Timeout(limit))),
            None => self.inner.fetch(reference).await,
        }
    }
}

#[async_trait]
impl<S: FrameSource> FrameSource for RetryingSource<S> {
    async fn fetch(&self, reference: &str) -> Result<Bytes, FetchError> {
        let mut retry_count = 0;

        loop {
            match self.attempt(reference).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() && retry_count < self.policy.max_retries => {
                    retry_count += 1;
                    let delay = self.policy.delay_for(retry_count);

                    warn!(
                        error = %e,
                        reference = %reference,
                        retry = retry_count,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Fetch failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
