//! Error types for taskdocs.
//!
//! Library crates use [`TaskDocsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics, and renders
//! [`ErrorPayload`] when a structured result is requested.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Why a single-task lookup came back empty after consulting every source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionReason {
    /// Neither the inventory nor the public index knows the identifier.
    UnknownIdentifier,
    /// The public index lists the task, but its documentation could not be fetched.
    DocumentationUnavailable,
}

impl std::fmt::Display for ExhaustionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownIdentifier => f.write_str("not present in the index or the inventory"),
            Self::DocumentationUnavailable => {
                f.write_str("listed in the index but its documentation could not be fetched")
            }
        }
    }
}

/// Top-level error type for all taskdocs operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskDocsError {
    /// The requested resource does not exist (HTTP 404/410). Never retried.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The server asked us to slow down (HTTP 429).
    #[error("rate limited: {url}")]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },

    /// The request exceeded its deadline and was cancelled. Never retried.
    #[error("timed out after {}ms: {url}", .after.as_millis())]
    Timeout { url: String, after: Duration },

    /// Connection failure or 5xx response; retried with backoff.
    #[error("transient error: {url}: {message}")]
    Transient {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// Non-retryable client error other than not-found (401, 403, 400, ...).
    #[error("HTTP {status}: {url}")]
    Http { url: String, status: u16 },

    /// The retry budget was spent; wraps the last underlying failure.
    #[error("gave up after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: Box<TaskDocsError>,
    },

    /// The caller passed something that is not a `Name@MajorVersion` identifier.
    #[error("malformed input: {message}")]
    MalformedInput { message: String },

    /// Every source was consulted and none produced a usable record.
    #[error("task {identifier} unavailable: {reason}")]
    SourceExhausted {
        identifier: String,
        reason: ExhaustionReason,
    },

    /// Inventory credentials or organization are not configured.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Response body could not be decoded into the expected shape.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TaskDocsError>;

impl TaskDocsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a malformed-input error from any displayable message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the fetch layer may try this request again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transient { .. })
    }

    /// The innermost cause, looking through [`TaskDocsError::RetryExhausted`].
    pub fn root_cause(&self) -> &TaskDocsError {
        match self {
            Self::RetryExhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::RateLimited { .. } => "rate_limited",
            Self::Timeout { .. } => "timeout",
            Self::Transient { .. } => "transient",
            Self::Http { .. } => "http_error",
            Self::RetryExhausted { .. } => "retry_exhausted",
            Self::MalformedInput { .. } => "malformed_input",
            Self::SourceExhausted { .. } => "source_exhausted",
            Self::NotConfigured(_) => "not_configured",
            Self::Config { .. } => "config",
            Self::Parse { .. } => "parse",
            Self::Io { .. } => "io",
        }
    }

    /// Render this error as a structured, serializable payload.
    pub fn to_payload(&self) -> ErrorPayload {
        let reason = match self {
            Self::SourceExhausted { reason, .. } => Some(*reason),
            _ => None,
        };
        ErrorPayload {
            code: self.code(),
            message: self.to_string(),
            reason,
        }
    }
}

/// Caller-facing shape of a failed request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ExhaustionReason>,
}
