use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("invalid vector format: {0}")]
    InvalidVectorFormat(String),

    #[error("invalid query vector: {0}")]
    InvalidQueryVector(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation error (status {status:?}): {message}")]
    Operation { status: Option<u16>, message: String },

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl VectorStoreError {
    /// HTTP-like status code, when one is known for this error kind.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::IndexNotFound(_) => Some(404),
            Self::RateLimited(_) => Some(429),
            Self::ServiceUnavailable(_) => Some(503),
            Self::InvalidVectorFormat(_) | Self::InvalidQueryVector(_) => Some(400),
            Self::Operation { status, .. } => *status,
            Self::Timeout(_) | Self::Unknown(_) => None,
        }
    }

    /// Whether a bounded retry may help: timeouts, rate limits, and 5xx-class
    /// operation failures. Auth and malformed-input errors are never retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::RateLimited(_) => true,
            Self::Operation { status, .. } => status.is_none_or(|s| s >= 500),
            Self::Unknown(_) => true,
            Self::Unauthorized(_)
            | Self::Forbidden(_)
            | Self::IndexNotFound(_)
            | Self::ServiceUnavailable(_)
            | Self::InvalidVectorFormat(_)
            | Self::InvalidQueryVector(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(VectorStoreError::Unauthorized(String::new()).status(), Some(401));
        assert_eq!(VectorStoreError::IndexNotFound(String::new()).status(), Some(404));
        assert_eq!(VectorStoreError::RateLimited(String::new()).status(), Some(429));
        assert_eq!(
            VectorStoreError::Operation {
                status: Some(502),
                message: String::new()
            }
            .status(),
            Some(502)
        );
        assert_eq!(VectorStoreError::Timeout(Duration::from_secs(1)).status(), None);
    }

    #[test]
    fn auth_errors_never_retryable() {
        assert!(!VectorStoreError::Unauthorized(String::new()).is_retryable());
        assert!(!VectorStoreError::Forbidden(String::new()).is_retryable());
        assert!(!VectorStoreError::InvalidVectorFormat(String::new()).is_retryable());
    }

    #[test]
    fn transient_errors_retryable() {
        assert!(VectorStoreError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(VectorStoreError::RateLimited(String::new()).is_retryable());
        assert!(
            VectorStoreError::Operation {
                status: Some(503),
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            !VectorStoreError::Operation {
                status: Some(422),
                message: String::new()
            }
            .is_retryable()
        );
    }
}
