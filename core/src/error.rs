use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Validation failed on {} field(s)", errors.len())]
    Validation { errors: Vec<FieldError> },

    #[error("Operation cancelled: the owning view was unmounted")]
    Cancelled,

    #[error("Position '{position_id}' not found")]
    UnknownPosition { position_id: String },

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Illegal status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: crate::referral::ReferralStatus,
        to:   crate::referral::ReferralStatus,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;

/// Failures raised by a `LocalStorage` backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Quota exceeded writing '{key}': needed {needed} bytes, {available} available")]
    QuotaExceeded {
        key:       String,
        needed:    usize,
        available: usize,
    },

    #[error("Corrupt value under '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

/// A single inline validation failure on a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field:   String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field:   field.to_string(),
            message: message.into(),
        }
    }
}
