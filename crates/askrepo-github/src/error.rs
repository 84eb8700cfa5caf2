use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GithubError>;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("no GitHub token configured (set GITHUB_TOKEN or pass one explicitly)")]
    MissingToken,

    #[error("invalid request parameters: {0}")]
    InvalidParams(String),

    #[error("GitHub rejected the credentials (401)")]
    Unauthorized,

    #[error("access forbidden (403): {0}")]
    Forbidden(String),

    #[error("GitHub rate limit exhausted (403)")]
    RateLimited,

    #[error("not found (404): {0}")]
    NotFound(String),

    #[error("request rejected as unprocessable (422): {0}")]
    Validation(String),

    #[error("GitHub API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed API response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("content decode failed for {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("request exceeded time budget of {0:?}")]
    Timeout(Duration),
}

impl GithubError {
    /// Whether retrying the same request can plausibly succeed.
    ///
    /// Credential, not-found, and validation failures are final; transport
    /// errors, rate limiting, timeouts, and 5xx responses are transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited | Self::Http(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::MissingToken
            | Self::InvalidParams(_)
            | Self::Unauthorized
            | Self::Forbidden(_)
            | Self::NotFound(_)
            | Self::Validation(_)
            | Self::ServiceUnavailable(_)
            | Self::Json(_)
            | Self::Decode { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let e = GithubError::Api {
            status: 502,
            message: "bad gateway".to_owned(),
        };
        assert!(e.is_retryable());
        assert!(GithubError::RateLimited.is_retryable());
        assert!(GithubError::Timeout(Duration::from_secs(30)).is_retryable());
    }

    #[test]
    fn credential_and_client_errors_are_final() {
        assert!(!GithubError::Unauthorized.is_retryable());
        assert!(!GithubError::NotFound("repo".to_owned()).is_retryable());
        assert!(!GithubError::Validation("bad ref".to_owned()).is_retryable());
        let e = GithubError::Api {
            status: 418,
            message: "teapot".to_owned(),
        };
        assert!(!e.is_retryable());
    }
}
