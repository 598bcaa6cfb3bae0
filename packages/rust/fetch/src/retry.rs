//! Failure classification and backoff delays.
//!
//! | failure                         | retried | delay                                  |
//! |---------------------------------|---------|----------------------------------------|
//! | 404 / 410                       | no      |                                        |
//! | 429 with `Retry-After`          | yes     | the advertised delay                   |
//! | 429 without `Retry-After`       | yes     | `rate_limit_delay × 2^(attempt-1)`     |
//! | deadline exceeded               | no      |                                        |
//! | 5xx or connection failure       | yes     | `base_delay × 2^(attempt-1)`           |
//! | other 4xx                       | no      |                                        |

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use taskdocs_shared::{FetchConfig, TaskDocsError};

/// Cap on the backoff exponent so delays cannot overflow.
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Map a non-success HTTP status to an error.
pub(crate) fn classify_status(url: &str, status: StatusCode, headers: &HeaderMap) -> TaskDocsError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => TaskDocsError::NotFound {
            url: url.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => TaskDocsError::RateLimited {
            url: url.to_string(),
            retry_after: parse_retry_after(headers),
        },
        s if s.is_server_error() => TaskDocsError::Transient {
            url: url.to_string(),
            status: Some(s.as_u16()),
            message: format!("HTTP {s}"),
        },
        s => TaskDocsError::Http {
            url: url.to_string(),
            status: s.as_u16(),
        },
    }
}

/// Map a transport-level reqwest failure to an error.
pub(crate) fn classify_transport(
    url: &str,
    err: &reqwest::Error,
    deadline: Duration,
) -> TaskDocsError {
    if err.is_timeout() {
        TaskDocsError::Timeout {
            url: url.to_string(),
            after: deadline,
        }
    } else {
        TaskDocsError::Transient {
            url: url.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Seconds form of `Retry-After`. The HTTP-date form is not honored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// How long to wait before attempt `attempt + 1`, given that attempt
/// `attempt` (1-based) failed with `err`. `None` means do not retry.
pub(crate) fn delay_before_retry(
    err: &TaskDocsError,
    attempt: u32,
    config: &FetchConfig,
) -> Option<Duration> {
    match err {
        TaskDocsError::RateLimited {
            retry_after: Some(advertised),
            ..
        } => Some(*advertised),
        TaskDocsError::RateLimited {
            retry_after: None, ..
        } => Some(exponential(config.rate_limit_delay, attempt)),
        TaskDocsError::Transient { .. } => Some(exponential(config.base_delay, attempt)),
        _ => None,
    }
}

fn exponential(base: Duration, attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    base.saturating_mul(1_u32 << shift)
}
