//! Error types for the audit

use reward_audit_storage::StorageError;
use thiserror::Error;

/// Failures of a single chain read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Malformed identifier; fatal for that item only
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network or RPC failure; retryable by the caller
    #[error("chain unavailable: {0}")]
    ChainUnavailable(String),
}

impl ChainError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainError::ChainUnavailable(_))
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        // Endpoint URLs may embed API keys; keep them out of records and logs.
        let err = err.without_url();
        if err.is_timeout() {
            ChainError::ChainUnavailable(format!("request timed out: {}", err))
        } else {
            ChainError::ChainUnavailable(err.to_string())
        }
    }
}

/// Failures that abort a whole audit run.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("ledger store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("chain check failed: {0}")]
    Chain(#[from] ChainError),

    #[error("answer not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;
    use reward_audit_storage::PoolError;

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(ChainError::ChainUnavailable("boom".into()).is_retryable());
        assert!(!ChainError::InvalidInput("empty".into()).is_retryable());
    }

    #[test]
    fn test_store_error_maps_to_store_unavailable() {
        let err: AuditError = StorageError::Pool(PoolError::Closed).into();
        assert!(matches!(err, AuditError::StoreUnavailable(_)));
        assert!(err.to_string().contains("ledger store unavailable"));
    }
}
