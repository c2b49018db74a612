//! GitHub API error types.

use thiserror::Error;

/// Rate-limit related headers captured from a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitHeaders {
    /// `X-RateLimit-Remaining`.
    pub remaining: Option<u32>,

    /// `X-RateLimit-Reset` as a Unix timestamp.
    pub reset: Option<u64>,

    /// `Retry-After` in seconds.
    pub retry_after: Option<u64>,
}

impl RateLimitHeaders {
    /// Parses raw header values; unparsable values are treated as absent.
    pub fn from_values(
        remaining: Option<&str>,
        reset: Option<&str>,
        retry_after: Option<&str>,
    ) -> Self {
        Self {
            remaining: remaining.and_then(|v| v.trim().parse().ok()),
            reset: reset.and_then(|v| v.trim().parse().ok()),
            retry_after: retry_after.and_then(|v| v.trim().parse().ok()),
        }
    }
}

/// Errors that can occur when calling the GitHub API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request quota is exhausted.
    #[error("GitHub rate limit exceeded")]
    RateLimited {
        /// Unix timestamp when the quota resets, if reported.
        reset_at: Option<u64>,
        /// Seconds to wait from a `Retry-After` header, if present.
        retry_after: Option<u64>,
    },

    /// The requested resource does not exist.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Any other non-success HTTP status.
    #[error("GitHub returned {status} for {path}: {message}")]
    Http {
        status: u16,
        path: String,
        message: String,
    },

    /// Network or client failure.
    #[error(transparent)]
    Transport(#[from] octocrab::Error),

    /// A response body could not be decoded.
    #[error("Failed to decode response for {path}: {message}")]
    Decode { path: String, message: String },
}

impl ApiError {
    /// Classifies a non-success response.
    ///
    /// HTTP 429, and HTTP 403 with an exhausted quota, a `Retry-After` header
    /// or a message mentioning the rate limit, become [`ApiError::RateLimited`].
    pub fn from_response(status: u16, headers: &RateLimitHeaders, body: &str, path: &str) -> Self {
        let message = extract_message(body);

        let quota_exhausted = headers.remaining == Some(0)
            || headers.retry_after.is_some()
            || message.to_ascii_lowercase().contains("rate limit");

        match status {
            429 => Self::rate_limited(headers),
            403 if quota_exhausted => Self::rate_limited(headers),
            404 => Self::NotFound {
                path: path.to_string(),
            },
            _ => Self::Http {
                status,
                path: path.to_string(),
                message,
            },
        }
    }

    fn rate_limited(headers: &RateLimitHeaders) -> Self {
        Self::RateLimited {
            reset_at: headers.reset,
            retry_after: headers.retry_after,
        }
    }

    /// Returns true if the quota is exhausted and the call may be retried later.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns true for a 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Pulls the `message` field out of a GitHub error body, falling back to the raw text.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
