//! Domain errors for the pipewatch aggregation tree.
//!
//! Every variant is node-local and non-fatal: a node that observes one of
//! these keeps its last good contribution and tries again on its next tick.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single adapter fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request to {url} failed: {cause}")]
    Network { url: String, cause: String },

    #[error("Upstream {url} returned {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed upstream payload: {0}")]
    Parse(String),

    #[error("Image reference does not match the expected pattern: {0}")]
    PatternMismatch(String),

    #[error("Status target cannot be resolved: {0}")]
    InvalidTarget(String),
}

impl FetchError {
    /// Short machine-friendly label, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::HttpStatus { .. } => "http_status",
            Self::Timeout(_) => "timeout",
            Self::Parse(_) => "parse",
            Self::PatternMismatch(_) => "pattern_mismatch",
            Self::InvalidTarget(_) => "invalid_target",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(FetchError::Timeout(Duration::from_secs(1)).kind(), "timeout");
        assert_eq!(FetchError::Parse("x".into()).kind(), "parse");
        assert_eq!(
            FetchError::HttpStatus {
                url: "http://x".into(),
                status: 500
            }
            .kind(),
            "http_status"
        );
    }

    #[test]
    fn test_serde_error_maps_to_parse() {
        let err: FetchError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, FetchError::Parse(_)));
        assert!(!err.is_timeout());
    }
}
