//! GitHub API client.

use std::future::Future;
use std::time::Duration;

use octocrab::Octocrab;
use octocrab::service::middleware::retry::RetryConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{Config, DEFAULT_API_URL, DEFAULT_RETRIES, DEFAULT_TIMEOUT};
use crate::error::Result;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Client for interacting with the GitHub API.
#[derive(Clone)]
pub struct GitHubClient {
    pub(crate) octocrab: Octocrab,
    pub(crate) max_retries: u32,
    pub(crate) retry_delay: Duration,
}

impl GitHubClient {
    /// Create a new GitHub client with the given token.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::build(token.into(), DEFAULT_API_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client for GitHub Enterprise with a custom base URL.
    pub fn with_enterprise(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let mut url = base_url.into();
        // Remove trailing slash if present
        if url.ends_with('/') {
            url.pop();
        }
        Self::build(token.into(), &url, DEFAULT_TIMEOUT)
    }

    /// Create a client from run configuration and a resolved token.
    pub fn from_config(config: &Config, token: impl Into<String>) -> Result<Self> {
        let client = Self::build(token.into(), &config.api_url, config.request_timeout)?;
        Ok(client.with_retry_policy(config.max_retries, DEFAULT_RETRY_DELAY))
    }

    fn build(token: String, base_url: &str, timeout: Duration) -> Result<Self> {
        // Retries are decided per call below; ref creation must never be replayed.
        let octocrab = Octocrab::builder()
            .personal_token(token)
            .base_uri(base_url.to_string())?
            .add_retry_config(RetryConfig::None)
            .set_connect_timeout(Some(timeout))
            .set_read_timeout(Some(timeout))
            .build()?;

        Ok(Self {
            octocrab,
            max_retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Set how often read-only calls are retried and the initial backoff.
    pub fn with_retry_policy(mut self, max_retries: u32, delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = delay;
        self
    }

    /// Make a GET request, retrying transient failures.
    pub(crate) async fn get<T, P>(&self, route: &str, params: Option<&P>) -> octocrab::Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized + Sync,
    {
        self.with_retry(route, || self.octocrab.get(route, params))
            .await
    }

    /// Make a POST request. Never retried.
    pub(crate) async fn post<T, B>(&self, route: &str, body: &B) -> octocrab::Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        self.octocrab.post(route, Some(body)).await
    }

    async fn with_retry<T, F, Fut>(&self, route: &str, mut call: F) -> octocrab::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = octocrab::Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(e) if attempt < self.max_retries && is_transient(&e) => {
                    let delay = self.retry_delay * 2u32.pow(attempt);
                    attempt += 1;
                    tracing::debug!(
                        route,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %crate::error::describe_octocrab(&e),
                        "transient GitHub error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

/// HTTP status of a GitHub error response, if the error is one.
pub(crate) fn status_code(err: &octocrab::Error) -> Option<u16> {
    match err {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

/// Server errors, rate limiting, and transport failures are worth retrying.
fn is_transient(err: &octocrab::Error) -> bool {
    match err {
        octocrab::Error::Service { .. } => true,
        _ => status_code(err).is_some_and(|status| status == 429 || status >= 500),
    }
}
