//! Error type for Lichess API calls, plus the HTTP/reqwest mapping helpers.

use std::time::Duration;

use lichess_auth::AuthError;
use lichess_ndjson::NdjsonError;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Errors from Lichess API operations.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LichessError {
    // Retryable errors
    /// Network-level error (connection reset, DNS failure, etc.).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The request did not complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Too many requests. Lichess asks clients to wait a full minute.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Delay from the `Retry-After` header, if present.
        retry_after: Option<Duration>,
    },
    /// Lichess returned a 5xx status.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    // Terminal errors
    /// Missing, invalid, or revoked token (HTTP 401).
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// The token lacks the required scope or the resource is not yours (HTTP 403).
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Unknown user, study, or round (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),
    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code.
        status: u16,
        /// Response body text.
        body: String,
    },
    /// The response body was not the expected JSON.
    #[error("invalid response: {0}")]
    Decode(String),
    /// Reading an NDJSON listing failed.
    #[error("stream error: {0}")]
    Stream(#[from] NdjsonError),
    /// Token storage failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    /// The client was configured with an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LichessError {
    /// Whether this error is likely transient and the request can be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_)
            | Self::Timeout(_)
            | Self::RateLimited { .. }
            | Self::ServiceUnavailable(_) => true,
            Self::Stream(NdjsonError::Source(_)) => true,
            _ => false,
        }
    }
}

/// Map a non-success HTTP status from Lichess to a [`LichessError`].
///
/// Reference: <https://lichess.org/api#section/Introduction/Rate-limiting>
pub(crate) fn map_http_status(
    status: reqwest::StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> LichessError {
    match status.as_u16() {
        401 => LichessError::Authentication(body.to_string()),
        403 => LichessError::Forbidden(body.to_string()),
        404 => LichessError::NotFound(body.to_string()),
        429 => LichessError::RateLimited { retry_after },
        500..=599 => LichessError::ServiceUnavailable(body.to_string()),
        code => LichessError::Http {
            status: code,
            body: body.to_string(),
        },
    }
}

/// Map a [`reqwest::Error`] to a [`LichessError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> LichessError {
    if err.is_timeout() {
        LichessError::Timeout(Box::new(err))
    } else {
        LichessError::Network(Box::new(err))
    }
}

/// Parse a `Retry-After` header given in seconds.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
