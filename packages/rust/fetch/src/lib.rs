//! Resilient document fetching: TTL cache, deadlines, and bounded retry.
//!
//! A [`Fetcher`] is constructed explicitly and shared by reference (or `Arc`)
//! between callers; nothing here is process-global. Concurrent misses for the
//! same URL each go to the network; requests are not coalesced.

mod cache;
mod retry;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use taskdocs_shared::{FetchConfig, Result, TaskDocsError};

pub use cache::TtlCache;

/// User-Agent string for all outgoing requests.
const USER_AGENT: &str = concat!("taskdocs/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// HTTP Basic credentials attached to a request.
#[derive(Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Per-call fetch options.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Ignore any cached copy and go to the network. The fresh response is
    /// still stored.
    pub skip_cache: bool,
    /// Override the configured cache lifetime for this entry.
    pub ttl: Option<Duration>,
    /// Credentials to send with the request.
    pub auth: Option<BasicAuth>,
}

impl FetchOptions {
    pub fn uncached() -> Self {
        Self {
            skip_cache: true,
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Cache-aside HTTP fetcher with a bounded retry policy.
pub struct Fetcher {
    config: FetchConfig,
    client: Client,
    cache: TtlCache<String>,
}

impl Fetcher {
    /// Create a new fetcher with an empty cache.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| TaskDocsError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            cache: TtlCache::new(),
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Drop every cached document.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Number of cached documents (including expired, not yet evicted ones).
    pub async fn cached_len(&self) -> usize {
        self.cache.len().await
    }

    /// Fetch `url` as text.
    ///
    /// A fresh cache hit returns without touching the network. A miss performs
    /// the request (with retries) and stores the body under the full TTL.
    #[instrument(skip(self, opts), fields(url = %url))]
    pub async fn fetch(&self, url: &str, opts: &FetchOptions) -> Result<String> {
        if !opts.skip_cache {
            if let Some(hit) = self.cache.get(url).await {
                debug!("cache hit");
                return Ok(hit);
            }
            debug!("cache miss");
        }

        let body = self.fetch_with_retry(url, opts).await?;
        let ttl = opts.ttl.unwrap_or(self.config.cache_ttl);
        self.cache.insert(url, body.clone(), ttl).await;
        Ok(body)
    }

    /// Fetch `url` and decode the body as JSON.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        opts: &FetchOptions,
    ) -> Result<T> {
        let body = self.fetch(url, opts).await?;
        serde_json::from_str(&body)
            .map_err(|e| TaskDocsError::parse(format!("{url}: invalid JSON response: {e}")))
    }

    async fn fetch_with_retry(&self, url: &str, opts: &FetchOptions) -> Result<String> {
        let mut attempt: u32 = 1;
        loop {
            let err = match self.fetch_once(url, opts).await {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            let Some(delay) = retry::delay_before_retry(&err, attempt, &self.config) else {
                debug!(attempt, error = %err, "not retryable");
                return Err(err);
            };

            if attempt >= self.config.max_attempts {
                warn!(attempt, error = %err, "retry budget exhausted");
                return Err(TaskDocsError::RetryExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// One attempt, bounded by the configured deadline. Dropping the inner
    /// future on expiry cancels the in-flight request.
    async fn fetch_once(&self, url: &str, opts: &FetchOptions) -> Result<String> {
        let deadline = self.config.timeout;
        match tokio::time::timeout(deadline, self.send(url, opts)).await {
            Ok(result) => result,
            Err(_) => Err(TaskDocsError::Timeout {
                url: url.to_string(),
                after: deadline,
            }),
        }
    }

    async fn send(&self, url: &str, opts: &FetchOptions) -> Result<String> {
        let mut request = self.client.get(url);
        if let Some(auth) = &opts.auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }

        let deadline = self.config.timeout;
        let response = request
            .send()
            .await
            .map_err(|e| retry::classify_transport(url, &e, deadline))?;

        let status = response.status();
        if !status.is_success() {
            return Err(retry::classify_status(url, status, response.headers()));
        }

        response
            .text()
            .await
            .map_err(|e| retry::classify_transport(url, &e, deadline))
    }
}
