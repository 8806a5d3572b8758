//! Storage error types.

use thiserror::Error;

/// Local store operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Document not found in storage.
    #[error("document not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),

    /// Stored bytes are not valid JSON, or a value failed to encode.
    #[error("malformed document: {0}")]
    Malformed(String),
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            _ => Self::Operation(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<StorageError> for shiftbook_shared::AppError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}
