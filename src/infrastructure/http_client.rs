//! HTTP client for the external JSON services with rate limiting
//!
//! Provides a shared client for the search, deep-link and research
//! endpoints, with a global request-rate ceiling and proper error handling.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client, Response,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use tokio_util::sync::CancellationToken;

/// HTTP client configuration.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "linkpick/0.3".to_string(),
            timeout_seconds: 30,
            max_requests_per_second: 5,
            follow_redirects: true,
        }
    }
}

/// Rate-limited HTTP client shared by the service implementations.
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self { client, rate_limiter, config })
    }

    /// POST a JSON body with rate limiting.
    ///
    /// The response is returned regardless of status — service clients
    /// decide whether a non-2xx body carries a structured error payload.
    pub async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Response> {
        self.rate_limiter.until_ready().await;

        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to POST to: {url}"))?;

        tracing::debug!("POST {} -> {}", url, response.status());
        Ok(response)
    }

    /// POST a JSON body with rate limiting and cancellation support.
    pub async fn post_json_with_cancellation(
        &self,
        url: &str,
        body: &serde_json::Value,
        cancellation: &CancellationToken,
    ) -> Result<Response> {
        if cancellation.is_cancelled() {
            anyhow::bail!("Request cancelled before starting");
        }

        tokio::select! {
            _ = self.rate_limiter.until_ready() => {},
            _ = cancellation.cancelled() => {
                anyhow::bail!("Request cancelled during rate limiting");
            }
        }

        tracing::debug!("POST {}", url);
        let response = tokio::select! {
            result = self.client.post(url).json(body).send() => {
                result.with_context(|| format!("Failed to POST to: {url}"))?
            },
            _ = cancellation.cancelled() => {
                tracing::warn!("HTTP request cancelled for URL: {}", url);
                anyhow::bail!("HTTP request cancelled");
            }
        };

        tracing::debug!("POST {} -> {}", url, response.status());
        Ok(response)
    }

    /// Get the configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}
