//! Sync error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur while syncing with the remote table.
///
/// None of them is fatal: local state stays authoritative and the failure is
/// logged.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote table rejected or failed an operation.
    #[error("remote operation failed: {0}")]
    Remote(String),

    /// Local store failure while applying a change.
    #[error(transparent)]
    Store(#[from] StorageError),

    /// The change feed closed.
    #[error("change feed closed")]
    FeedClosed,
}

impl SyncError {
    /// Create a remote error.
    #[must_use]
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }
}

impl From<SyncError> for shiftbook_shared::AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Store(e) => e.into(),
            other => Self::Sync(other.to_string()),
        }
    }
}
