//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made during a run:
//! - Building the HTTP client with a proper user agent string
//! - Single GET attempts with a per-attempt timeout
//! - Classifying failures into retryable and unexpected ones
//! - The dashboard retry loop

use crate::config::UserAgentConfig;
use crate::harvester::deadline::Deadline;
use crate::harvester::policy::{pause_within, RetryPolicy};
use crate::HarvestError;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Outcome of a single fetch attempt that did not hit an unexpected fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// 200 OK with the response body
    Success(String),

    /// Expected failure; the caller retries or requeues
    Retry(RetryReason),
}

/// Why an attempt is worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// The per-attempt timeout elapsed
    TimedOut,

    /// The server answered with something other than 200
    Status(u16),
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut => write!(f, "request timed out"),
            Self::Status(code) => write!(f, "HTTP {}", code),
        }
    }
}

/// A source of page bodies
///
/// Implementations must map transport timeouts and non-200 responses to
/// [`Attempt::Retry`] and return every other failure as an error.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<Attempt, HarvestError>;
}

/// Builds an HTTP client with proper configuration
///
/// Request timeouts are set per attempt, so the client itself only limits
/// connection setup.
///
/// # Example
///
/// ```no_run
/// use status_harvester::config::UserAgentConfig;
/// use status_harvester::harvester::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetch`] over a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &UserAgentConfig) -> Result<Self, HarvestError> {
        Ok(Self::new(build_http_client(config)?))
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<Attempt, HarvestError> {
        let response = match self.client.get(url.clone()).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Ok(Attempt::Retry(RetryReason::TimedOut)),
            Err(e) => {
                return Err(HarvestError::Http {
                    url: url.to_string(),
                    source: e,
                })
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(Attempt::Retry(RetryReason::Status(status.as_u16())));
        }

        // The timeout covers the body as well
        match response.text().await {
            Ok(body) => Ok(Attempt::Success(body)),
            Err(e) if e.is_timeout() => Ok(Attempt::Retry(RetryReason::TimedOut)),
            Err(e) => Err(HarvestError::Http {
                url: url.to_string(),
                source: e,
            }),
        }
    }
}

/// Fetches the dashboard page, retrying until it succeeds or time runs out
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 200 | Return the body |
/// | Other HTTP status | Pause, retry |
/// | Attempt timeout | Pause, retry |
/// | Run deadline reached | `HarvestError::Deadline` |
/// | Any other transport error | Propagate |
///
/// Each attempt gets a fresh random timeout from `policy.dashboard`, clamped
/// to the remaining budget.
pub async fn fetch_dashboard<F: Fetch>(
    fetcher: &F,
    url: &Url,
    deadline: &Deadline,
    policy: &RetryPolicy,
) -> Result<String, HarvestError> {
    let mut attempt: u32 = 0;

    loop {
        let timeout = deadline.until(policy.dashboard.sample())?;
        attempt += 1;
        tracing::debug!(
            "Dashboard attempt {} for {} (timeout {:.1}s)",
            attempt,
            url,
            timeout.as_secs_f64()
        );

        match fetcher.fetch(url, timeout).await? {
            Attempt::Success(body) => {
                tracing::info!(
                    "Fetched dashboard {} after {} attempt(s), {} bytes",
                    url,
                    attempt,
                    body.len()
                );
                return Ok(body);
            }
            Attempt::Retry(reason) => {
                tracing::warn!(
                    "Dashboard attempt {} failed: {} ({:.0}s left)",
                    attempt,
                    reason,
                    deadline.remaining().as_secs_f64()
                );
                pause_within(deadline, policy.pause).await;
            }
        }
    }
}
