// Password Vault - Top-level error types
//
// Aggregates errors from the store, configuration and I/O layers into a
// single error enum for the binary and gateway boundary. Request-level
// failures never reach this type: the vault service turns them into
// responses.

use thiserror::Error;

/// Top-level error type for process-level operations.
#[derive(Debug, Error)]
pub enum PasswordVaultError {
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PasswordVaultError>;
