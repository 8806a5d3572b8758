//! Application state error types.

use thiserror::Error;

use crate::auth::AuthError;
use crate::books::BookError;
use crate::ledger::LedgerError;
use crate::reports::ReconcileError;

/// Errors raised by application-level operations.
///
/// Wraps the module error that rejected the operation. State is unchanged
/// whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Login or permission failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Working entry edit rejected.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Finalization rejected.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Order or debtor edit rejected.
    #[error(transparent)]
    Book(#[from] BookError),
}

impl From<StateError> for shiftbook_shared::AppError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Auth(e) => e.into(),
            StateError::Ledger(e) => e.into(),
            StateError::Reconcile(e) => e.into(),
            StateError::Book(e) => e.into(),
        }
    }
}
