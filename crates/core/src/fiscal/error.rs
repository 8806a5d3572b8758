//! Fiscal calendar error types.

use thiserror::Error;

/// Errors that can occur while parsing fiscal identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FiscalError {
    /// Fiscal month identifier is not `YYYY-MM`.
    #[error("invalid fiscal month: {0}")]
    InvalidMonth(String),

    /// Date is not `YYYY-MM-DD`.
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

impl From<FiscalError> for shiftbook_shared::AppError {
    fn from(err: FiscalError) -> Self {
        Self::Validation(err.to_string())
    }
}
