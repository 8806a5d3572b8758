//! Shift ledger.
//!
//! This module implements the records cashiers produce:
//! - Shift kinds and their persisted labels
//! - Expense lines with the fixed daily line
//! - Shift entries and the working-entry edit operations
//! - Manager views merging a day's shifts

pub mod entry;
pub mod error;
pub mod expense;
pub mod types;
pub mod view;

#[cfg(test)]
mod entry_props;

pub use entry::ShiftEntry;
pub use error::LedgerError;
pub use expense::{ExpenseLine, ExpenseLineId, FIXED_DAILY_ID, FIXED_DAILY_ITEM};
pub use types::ShiftKind;
pub use view::{available_dates, expense_breakdown, merge_day_view, merged_entry};
