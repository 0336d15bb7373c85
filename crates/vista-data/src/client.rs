//! JSON fetch client.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::retry::RetryPolicy;
use crate::timeout::TimeoutConfig;

/// Error type for fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Timeout after {after:?} for {url}")]
    Timeout { url: String, after: Duration },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Request error: {0}")]
    Request(String),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Deserialization(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Fetch policy combining timeout and retry configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout: TimeoutConfig,
    pub retry: RetryPolicy,
}

impl FetchPolicy {
    pub fn new(timeout: TimeoutConfig, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }
}

/// GETs JSON documents relative to a base URL.
///
/// Every attempt is bounded by `policy.timeout.attempt`; failures the
/// retry policy accepts are retried after the configured backoff.
#[derive(Debug, Clone)]
pub struct JsonClient {
    client: Client,
    base_url: Option<String>,
    policy: FetchPolicy,
}

impl JsonClient {
    /// Create a client with the default policy.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_policy(FetchPolicy::default())
    }

    /// Create a client with an explicit policy.
    pub fn with_policy(policy: FetchPolicy) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("vista/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(policy.timeout.connect)
            .build()
            .map_err(FetchError::from_reqwest)?;
        Ok(Self {
            client,
            base_url: None,
            policy,
        })
    }

    /// Resolve relative paths against `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Absolute URL for a path. Absolute inputs are returned unchanged.
    pub fn url(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) if !path.contains("://") => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            _ => path.to_string(),
        }
    }

    /// GET `path` and decode the body as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url(path);
        let mut attempt = 0;

        loop {
            let result = self.attempt::<T>(&url).await;
            match result {
                Ok(value) => {
                    tracing::debug!(url = %url, attempt, "fetch succeeded");
                    return Ok(value);
                }
                Err(err) if self.policy.retry.should_retry(&err, attempt) => {
                    let delay = self.policy.retry.backoff.delay_for_attempt(attempt);
                    tracing::warn!(
                        url = %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::debug!(url = %url, attempt, error = %err, "fetch failed");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let budget = self.policy.timeout.attempt;
        let request = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(FetchError::from_reqwest)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Http {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let bytes = response.bytes().await.map_err(FetchError::from_reqwest)?;
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Deserialization(e.to_string()))
        };

        tokio::time::timeout(budget, request)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                after: budget,
            })?
    }
}
