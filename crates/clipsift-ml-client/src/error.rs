//! ML client error types.

use thiserror::Error;

pub type MlResult<T> = Result<T, MlError>;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("ML service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("ML service not configured")]
    NotConfigured,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MlError {
    pub fn is_retryable(&self) -> bool {
        match self {
            MlError::ServiceUnavailable(_) | MlError::Timeout(_) => true,
            MlError::Network(e) => !e.is_decode() && !e.is_builder(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(MlError::ServiceUnavailable("503".into()).is_retryable());
        assert!(MlError::Timeout(10).is_retryable());
        assert!(!MlError::InvalidResponse("2x3 expected".into()).is_retryable());
        assert!(!MlError::NotConfigured.is_retryable());
    }
}
