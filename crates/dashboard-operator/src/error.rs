//! Error types for the dashboard operator

use dashboard_reconcile::ReconcileError;
use thiserror::Error;

/// Operator errors
#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for OperatorError {
    fn from(err: config::ConfigError) -> Self {
        OperatorError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OperatorError {
    fn from(err: serde_json::Error) -> Self {
        OperatorError::Io(err.into())
    }
}

/// Result type for operator operations
pub type OperatorResult<T> = Result<T, OperatorError>;
