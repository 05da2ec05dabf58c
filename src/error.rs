use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatusError>;

/// Failure of the durable backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Balance unavailable for {address}: all {attempts} RPC endpoints failed")]
    BalanceUnavailable { address: String, attempts: usize },
}

/// Failure of a single endpoint during failover. Never leaves the fetcher.
#[derive(Error, Debug)]
pub enum RpcEndpointError {
    #[error("RPC client error: {0}")]
    Client(#[from] Box<solana_client::client_error::ClientError>),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("endpoint unavailable: {0}")]
    Unavailable(String),
}

/// Coarse classification a transport maps onto response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unavailable,
}

impl StatusError {
    pub fn validation(message: impl Into<String>) -> Self {
        StatusError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StatusError::Validation(_) => ErrorKind::Validation,
            StatusError::Store(_) | StatusError::BalanceUnavailable { .. } => {
                ErrorKind::Unavailable
            }
        }
    }
}

impl From<sqlx::Error> for StatusError {
    fn from(e: sqlx::Error) -> Self {
        StatusError::Store(StoreError::Database(e))
    }
}

impl From<serde_json::Error> for StatusError {
    fn from(e: serde_json::Error) -> Self {
        StatusError::Store(StoreError::Serde(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_separates_validation_from_backend() {
        assert_eq!(
            StatusError::validation("Invalid action").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            StatusError::from(StoreError::Unavailable("down".into())).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            StatusError::BalanceUnavailable {
                address: "x".into(),
                attempts: 3
            }
            .kind(),
            ErrorKind::Unavailable
        );
    }
}
