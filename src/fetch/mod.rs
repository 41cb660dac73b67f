//! Source fetchers for per-paper and per-venue content.
//!
//! This module defines the interface for fetching publication content from
//! external sources, plus the shared HTTP transport and retry machinery.
//! Each fetcher wraps one remote endpoint: [`arxiv::ArxivFetcher`] resolves a
//! single arXiv identifier to an abstract and author list, while
//! [`openreview::OpenReviewFetcher`] pulls a venue's whole accepted-submission
//! listing in one call.
//!
//! Transport failures are retried with bounded exponential backoff. A fetch
//! that exhausts its retries degrades to a sentinel "unavailable" result
//! rather than an error, so one bad paper never aborts a scrape.

pub mod arxiv;
pub mod openreview;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use thiserror::Error;
use tracing::warn;

/// User agent sent on every outbound request.
const HARVESTER_USER_AGENT: &str = concat!("paper-harvester/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while talking to a remote source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-success HTTP status
    #[error("unexpected HTTP status {status}: {body}")]
    Status {
        /// Status code returned by the server
        status: u16,
        /// Response body, truncated by the transport
        body: String,
    },

    /// Response arrived but could not be parsed into the expected shape
    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Minimal HTTP GET seam.
///
/// Fetchers and scrapers depend on this trait instead of a concrete client
/// so tests can substitute counting or scripted transports.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs a GET request and returns the response body as text.
    async fn get(&self, url: &str) -> FetchResult<String>;
}

/// Production transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport with the harvester user agent and a request timeout.
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(HARVESTER_USER_AGENT));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> FetchResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// Bounded exponential-backoff retry schedule.
///
/// The delay before retry `n` is `initial_delay * 2^(n-1)`: with the default
/// policy, attempts are spaced 1s, 2s, 4s, 8s apart and the fifth failure is
/// terminal.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts before giving up (including the first)
    pub max_attempts: usize,

    /// Delay before the first retry; doubles on each subsequent retry
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with explicit attempt count and initial delay.
    pub fn new(max_attempts: usize, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let doublings = attempt.saturating_sub(1).min(31) as u32;
        self.initial_delay * 2u32.saturating_pow(doublings)
    }
}

/// GETs `url`, retrying transport failures per `policy`.
///
/// Sleeps between attempts with doubling delays; the error from the final
/// attempt is returned once the retry ceiling is reached.
pub async fn get_with_retry(
    transport: &dyn HttpTransport,
    url: &str,
    policy: RetryPolicy,
) -> FetchResult<String> {
    let attempts = policy.max_attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match transport.get(url).await {
            Ok(body) => return Ok(body),
            Err(err) => {
                if attempt < attempts {
                    let delay = policy.delay_after(attempt);
                    warn!(url, attempt, ?delay, error = %err, "request failed, retrying");
                    tokio::time::sleep(delay).await;
                } else {
                    warn!(url, attempts, error = %err, "request failed, retries exhausted");
                }
                last_err = Some(err);
            }
        }
    }
    // attempts >= 1, so last_err is always set on this path
    Err(last_err.unwrap_or_else(|| FetchError::Http("no attempts made".to_string())))
}

/// Per-paper content returned by a source fetcher.
///
/// A failed fetch yields the sentinel pair (`None` abstract, empty authors)
/// instead of an error.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedContent {
    /// Abstract text, absent when the fetch failed
    pub abstract_text: Option<String>,

    /// Author display names in source order
    pub authors: Vec<String>,
}

impl FetchedContent {
    /// Sentinel returned after exhausted retries or a structural parse miss.
    pub fn unavailable() -> Self {
        Self {
            abstract_text: None,
            authors: Vec::new(),
        }
    }

    /// True when this is the sentinel failure pair.
    pub fn is_unavailable(&self) -> bool {
        self.abstract_text.is_none() && self.authors.is_empty()
    }
}

/// Trait for per-paper content fetchers.
///
/// `fetch` is infallible by contract: terminal failures degrade to
/// [`FetchedContent::unavailable`] so a single paper's failure never aborts
/// the surrounding scrape.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetches abstract and authors for one source identifier.
    async fn fetch(&self, identifier: &str) -> FetchedContent;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Transport that always fails, counting attempts.
    pub(crate) struct AlwaysFailTransport {
        pub calls: AtomicUsize,
    }

    impl AlwaysFailTransport {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl HttpTransport for AlwaysFailTransport {
        async fn get(&self, _url: &str) -> FetchResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Http("connection refused".to_string()))
        }
    }

    /// Transport that serves scripted responses in order, then fails.
    pub(crate) struct ScriptedTransport {
        responses: Mutex<Vec<FetchResult<String>>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedTransport {
        pub fn new(responses: Vec<FetchResult<String>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn get(&self, _url: &str) -> FetchResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(FetchError::Http("script exhausted".to_string())))
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(5, Duration::ZERO)
    }

    #[test]
    fn test_delay_schedule_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
        assert_eq!(policy.delay_after(4), Duration::from_secs(8));

        // Strictly increasing across the whole schedule
        for attempt in 1..4 {
            assert!(policy.delay_after(attempt + 1) > policy.delay_after(attempt));
            assert_eq!(
                policy.delay_after(attempt + 1),
                policy.delay_after(attempt) * 2
            );
        }
    }

    #[tokio::test]
    async fn test_retry_exhausts_exactly_max_attempts() {
        let transport = AlwaysFailTransport::new();
        let result = get_with_retry(&transport, "http://unreachable", fast_policy()).await;
        assert!(result.is_err());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_retry_stops_on_success() {
        let transport = ScriptedTransport::new(vec![
            Err(FetchError::Http("boom".to_string())),
            Err(FetchError::Http("boom".to_string())),
            Ok("body".to_string()),
        ]);
        let result = get_with_retry(&transport, "http://flaky", fast_policy()).await;
        assert_eq!(result.unwrap(), "body");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unavailable_sentinel() {
        let sentinel = FetchedContent::unavailable();
        assert!(sentinel.is_unavailable());
        assert!(sentinel.abstract_text.is_none());
        assert!(sentinel.authors.is_empty());

        let real = FetchedContent {
            abstract_text: Some("text".to_string()),
            authors: vec!["A".to_string()],
        };
        assert!(!real.is_unavailable());
    }
}
