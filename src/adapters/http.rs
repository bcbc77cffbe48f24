//! Shared HTTP plumbing for every upstream adapter.
//!
//! Wraps a single `reqwest` client with a per-request timeout and a
//! governor token bucket so that all polling nodes together stay within
//! the upstream APIs' quotas. Every failure is mapped into a
//! [`FetchError`]; nothing in here panics on bad input.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::models::{PollConfig, RateLimitConfig};

/// Read-only JSON HTTP client shared by all adapters.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    limiter: Arc<DefaultDirectRateLimiter>,
    timeout: Duration,
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("timeout", &self.timeout)
            .field("limiter", &"<governor>")
            .finish()
    }
}

impl UpstreamClient {
    /// Create a client from the rate-limit and poll configuration.
    pub fn new(rate_limit: &RateLimitConfig, poll: &PollConfig) -> FetchResult<Self> {
        Self::with_timeout(rate_limit, poll.fetch_timeout())
    }

    pub fn with_timeout(rate_limit: &RateLimitConfig, timeout: Duration) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("pipewatch"));

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                cause: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            limiter: Arc::new(RateLimiter::direct(quota(rate_limit))),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> FetchResult<T> {
        self.get_json_with(url, &HeaderMap::new()).await
    }

    /// GET `url` with extra headers and decode the JSON body.
    pub async fn get_json_with<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> FetchResult<T> {
        self.limiter.until_ready().await;

        tracing::trace!(url = url, "GET");

        let resp = self
            .http
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| self.map_send_error(url, &e))?;

        if !resp.status().is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| self.map_send_error(url, &e))?;

        serde_json::from_slice(&body)
            .map_err(|e| FetchError::Parse(format!("{url}: {e}")))
    }

    fn map_send_error(&self, url: &str, err: &reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network {
                url: url.to_string(),
                cause: err.to_string(),
            }
        }
    }
}

/// Headers for the GitHub REST API v3.
pub fn github_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(AUTHORIZATION, value);
        }
    }
    headers
}

fn quota(config: &RateLimitConfig) -> Quota {
    let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN);
    let rps = if config.requests_per_second.is_finite() && config.requests_per_second > 0.0 {
        config.requests_per_second
    } else {
        1.0
    };
    let period = Duration::from_secs_f64(1.0 / rps).max(Duration::from_nanos(1));
    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(burst)
}

/// Last non-empty `/` segment of a URL path.
pub fn last_path_segment(url: &reqwest::Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

/// `scheme://host[:port]` of a URL.
pub fn origin(url: &reqwest::Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
