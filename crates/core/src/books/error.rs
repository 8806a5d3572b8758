//! Side ledger error types.

use shiftbook_shared::types::{DebtorId, OrderId};
use thiserror::Error;

/// Errors that can occur when editing orders and debtors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// Order needs an item and a positive price.
    #[error("Order requires an item and a positive price")]
    IncompleteOrder,

    /// Debtor needs a name.
    #[error("Debtor name is required")]
    MissingName,

    /// Balance may not be negative.
    #[error("Balance cannot be negative")]
    NegativeBalance,

    /// A debtor with the same name already exists.
    #[error("Debtor already exists: {0}")]
    DuplicateDebtor(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Debtor not found.
    #[error("Debtor not found: {0}")]
    DebtorNotFound(DebtorId),

    /// Only super users may delete ledger rows.
    #[error("Only a super user may delete ledger rows")]
    Forbidden,
}

impl From<BookError> for shiftbook_shared::AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::OrderNotFound(_) | BookError::DebtorNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            BookError::DuplicateDebtor(_) => Self::Conflict(err.to_string()),
            BookError::Forbidden => Self::Forbidden(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}
