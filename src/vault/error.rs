// Password Vault - Service error taxonomy
//
// Each failure kind maps to exactly one status code. Store failures keep
// their cause for the log; the caller only sees a generic message.

use thiserror::Error;

use super::protocol::{ResponseBody, VaultResponse};
use crate::store::StoreError;

pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Required fields missing or empty.
    #[error("Missing required fields: {}", .0.join(", "))]
    Validation(Vec<&'static str>),

    /// No entry under (caller, entryId). Also covers entries owned by someone else.
    #[error("Password entry not found")]
    NotFound,

    #[error("Action not found")]
    UnrecognizedAction(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl VaultError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => STATUS_BAD_REQUEST,
            Self::NotFound | Self::UnrecognizedAction(_) => STATUS_NOT_FOUND,
            Self::Store(_) => STATUS_INTERNAL_ERROR,
        }
    }

    /// Classification reported in the `error` field and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::NotFound => "NotFound",
            Self::UnrecognizedAction(_) => "UnrecognizedAction",
            Self::Store(_) => "StoreError",
        }
    }

    pub fn to_response(&self) -> VaultResponse {
        let body = match self {
            Self::Store(_) => ResponseBody::new("An error occurred").with_error("Internal storage error"),
            other => ResponseBody::new(other.to_string()).with_error(other.kind()),
        };
        VaultResponse::json(self.status_code(), &body)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
