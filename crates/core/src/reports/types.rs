//! Report data types.
//!
//! Reports are derived data: every figure can be recomputed from the records
//! below it, and re-finalizing replaces the stored report.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shiftbook_shared::types::lenient_amount;

use crate::fiscal::FiscalMonth;

/// Closing figures for one business date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    /// Business date.
    pub date: NaiveDate,
    /// Total sales over the day's shifts.
    #[serde(with = "lenient_amount", default)]
    pub sales: Decimal,
    /// Total expenses over the day's shifts.
    #[serde(with = "lenient_amount", default)]
    pub expenses: Decimal,
    /// Sales minus expenses.
    #[serde(with = "lenient_amount", default)]
    pub net: Decimal,
    /// Number of shift entries aggregated.
    #[serde(default)]
    pub shift_count: usize,
    /// Username of the manager who finalized.
    #[serde(default)]
    pub finalized_by: String,
    /// When the report was last written. Absent on imported archives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DailyReport {
    /// Returns true if both reports carry the same figures.
    ///
    /// Ignores who finalized and when.
    #[must_use]
    pub fn same_figures(&self, other: &Self) -> bool {
        self.date == other.date
            && self.sales == other.sales
            && self.expenses == other.expenses
            && self.net == other.net
            && self.shift_count == other.shift_count
    }
}

/// Closing figures for one fiscal month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    /// Fiscal month, `YYYY-MM`.
    pub month: FiscalMonth,
    /// Total sales over the month's daily reports.
    #[serde(with = "lenient_amount", default)]
    pub sales: Decimal,
    /// Total expenses over the month's daily reports.
    #[serde(with = "lenient_amount", default)]
    pub expenses: Decimal,
    /// Sales minus expenses.
    #[serde(with = "lenient_amount", default)]
    pub net: Decimal,
    /// Number of daily reports aggregated.
    #[serde(default)]
    pub days_count: usize,
    /// Username of the manager who closed the month.
    #[serde(default)]
    pub finalized_by: String,
    /// When the month was closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    /// When background reconciliation last changed the figures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MonthlyReport {
    /// Returns true if the stored figures match the given totals.
    #[must_use]
    pub fn matches(&self, totals: &MonthTotals) -> bool {
        self.sales == totals.sales
            && self.expenses == totals.expenses
            && self.net == totals.net
            && self.days_count == totals.days_count
    }
}

/// Aggregated figures for one business date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayTotals {
    /// Total sales.
    pub sales: Decimal,
    /// Total expenses.
    pub expenses: Decimal,
    /// Sales minus expenses.
    pub net: Decimal,
    /// Number of shift entries.
    pub shift_count: usize,
}

/// Aggregated figures for one fiscal month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthTotals {
    /// Total sales.
    pub sales: Decimal,
    /// Total expenses.
    pub expenses: Decimal,
    /// Sales minus expenses.
    pub net: Decimal,
    /// Number of daily reports.
    pub days_count: usize,
}

/// Result of finalizing a day.
#[derive(Debug, Clone)]
pub struct DayFinalized {
    /// The report now stored for the date.
    pub report: DailyReport,
    /// The report it replaced, if the day had been finalized before.
    pub replaced: Option<DailyReport>,
    /// Entries newly flagged as finalized.
    pub newly_finalized: usize,
}

/// Result of closing a fiscal month.
#[derive(Debug, Clone)]
pub struct MonthFinalized {
    /// The report now stored for the month.
    pub report: MonthlyReport,
    /// The report it replaced, if the month had been closed before.
    pub replaced: Option<MonthlyReport>,
}
