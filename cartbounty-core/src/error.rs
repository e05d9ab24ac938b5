//! Error types for cart storage operations.

use thiserror::Error;

/// Errors raised when a configuration is rejected by [`Config::validate`](crate::Config::validate).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Batches must hold at least one cart
    #[error("batch size must be greater than zero")]
    ZeroBatchSize,

    /// Pages must hold at least one cart
    #[error("carts per page must be greater than zero")]
    ZeroPerPage,
}

/// Errors raised by [`Executor::insert_carts`](crate::Executor::insert_carts).
#[derive(Debug, Error)]
pub enum WriteError {
    /// A cart with the same primary key already exists in the cart table
    #[error("a cart with the same id already exists")]
    DuplicateCart,

    #[error("{0}")]
    Unknown(#[from] anyhow::Error),
}

/// Errors that abort the legacy cart transfer.
///
/// Every variant is raised before the transfer flag is persisted except
/// [`TransferError::Flag`], so the transfer runs again on the next activation.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The legacy table or the transfer flag could not be inspected
    #[error("failed to inspect transfer state: {0}")]
    Probe(#[source] anyhow::Error),

    #[error("failed to read legacy carts: {0}")]
    Read(#[source] anyhow::Error),

    /// Batch numbers are 1-based
    #[error("failed to write batch {batch} of {total}: {source}")]
    Write {
        batch: usize,
        total: usize,
        #[source]
        source: WriteError,
    },

    /// A single transaction covering every batch was rolled back
    #[error("failed to write {total} batches in one transaction: {source}")]
    Atomic {
        total: usize,
        #[source]
        source: WriteError,
    },

    #[error("failed to persist transfer flag: {0}")]
    Flag(#[source] anyhow::Error),
}

impl TransferError {
    /// Returns true when the transfer flag is still unset, so the next
    /// activation reads the legacy table again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Flag(_))
    }

    /// Returns true when the failure was caused by a reused cart id.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::Write {
                source: WriteError::DuplicateCart,
                ..
            } | Self::Atomic {
                source: WriteError::DuplicateCart,
                ..
            }
        )
    }
}

/// Errors that abort plugin activation.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("option store `{0}`")]
    Option(#[from] anyhow::Error),

    #[error("serde_json `{0}`")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_retryable() {
        let read = TransferError::Read(anyhow::anyhow!("no such table"));
        assert!(read.is_retryable());

        let write = TransferError::Write {
            batch: 2,
            total: 3,
            source: WriteError::DuplicateCart,
        };
        assert!(write.is_retryable());
        assert!(write.is_duplicate());
        assert_eq!(
            write.to_string(),
            "failed to write batch 2 of 3: a cart with the same id already exists"
        );

        let atomic = TransferError::Atomic {
            total: 3,
            source: WriteError::DuplicateCart,
        };
        assert!(atomic.is_retryable());
        assert!(atomic.is_duplicate());

        assert!(!TransferError::Flag(anyhow::anyhow!("locked")).is_retryable());
        assert!(!TransferError::Config(ConfigError::ZeroBatchSize).is_retryable());
    }
}
