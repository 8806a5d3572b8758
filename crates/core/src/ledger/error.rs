//! Ledger error types.
//!
//! Every variant is a validation rejection: the operation is aborted and the
//! working entry is left untouched.

use thiserror::Error;

/// Errors that can occur while editing shift entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Expense line needs both an item and a non-zero amount.
    #[error("Expense line requires an item and an amount")]
    IncompleteExpense,

    /// The mandatory daily line cannot be removed.
    #[error("The fixed daily expense line cannot be removed")]
    FixedLineRemoval,

    /// No expense line with the given key on the entry.
    #[error("Expense line not found: {0}")]
    ExpenseNotFound(String),

    /// A shift with no sales and no expense amounts cannot be finished.
    #[error("Cannot finish an empty shift")]
    EmptyShift,

    /// Shift label not recognized.
    #[error("Unknown shift: {0}")]
    UnknownShift(String),

    /// Expense line id is neither the fixed sentinel nor a stamp.
    #[error("Invalid expense line id: {0}")]
    InvalidLineId(String),
}

impl From<LedgerError> for shiftbook_shared::AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ExpenseNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::FixedLineRemoval | LedgerError::EmptyShift => {
                Self::BusinessRule(err.to_string())
            }
            _ => Self::Validation(err.to_string()),
        }
    }
}
