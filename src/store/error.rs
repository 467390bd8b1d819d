// Password Vault - Store error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Conditional write rejected: the key exists or was retired by a delete.
    #[error("Conditional write failed, item key already used: {0}")]
    Conflict(String),

    #[error("Store connection lock poisoned")]
    LockPoisoned,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
