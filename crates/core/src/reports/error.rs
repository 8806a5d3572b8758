//! Reconciliation error types.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::fiscal::FiscalMonth;

/// Errors that can occur when finalizing days and months.
///
/// All of them are validation rejections: nothing is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// No shift entries exist for the date.
    #[error("No shifts recorded for {0}, nothing to finalize")]
    NothingToFinalize(NaiveDate),

    /// No daily reports fall inside the fiscal month.
    #[error("No daily reports in fiscal month {0}, nothing to close")]
    NothingToClose(FiscalMonth),

    /// The fiscal window is still open.
    #[error("Fiscal month {month} cannot be closed before {closes_at}")]
    TooEarly {
        /// Month the close was attempted for.
        month: FiscalMonth,
        /// Earliest instant the month may be closed.
        closes_at: NaiveDateTime,
    },

    /// Only super users may finalize.
    #[error("Only a super user may finalize reports")]
    Forbidden,
}

impl From<ReconcileError> for shiftbook_shared::AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Forbidden => Self::Forbidden(err.to_string()),
            _ => Self::BusinessRule(err.to_string()),
        }
    }
}
