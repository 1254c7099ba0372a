//! Store error types

use std::path::PathBuf;
use thiserror::Error;

use crate::value::DataType;

/// Errors that can occur while reading or writing store fields
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to lock store {path}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file {path} is not a valid field document")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Field {key} holds a {found} value, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: DataType,
        found: DataType,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
