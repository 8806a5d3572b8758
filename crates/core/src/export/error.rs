//! Export error types.

use thiserror::Error;

/// Errors that can occur when building or delivering an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// There is no data to put in the document.
    #[error("Nothing to export: {0}")]
    NothingToExport(String),

    /// The sink failed to write the document.
    #[error("export delivery failed: {0}")]
    Delivery(String),
}

impl From<opendal::Error> for ExportError {
    fn from(err: opendal::Error) -> Self {
        Self::Delivery(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Delivery(err.to_string())
    }
}

impl From<ExportError> for shiftbook_shared::AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NothingToExport(_) => Self::Validation(err.to_string()),
            ExportError::Delivery(_) => Self::Internal(err.to_string()),
        }
    }
}
