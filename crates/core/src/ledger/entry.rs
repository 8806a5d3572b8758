//! Shift entries and the working-entry edit operations.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shiftbook_shared::types::{EntryId, lenient_amount};

use super::error::LedgerError;
use super::expense::ExpenseLine;
use super::types::{ShiftKind, optional_shift};

/// One worker's sales and expenses for one shift.
///
/// An entry is owned by its worker until a daily report finalizes it. After
/// that it is read-only for workers; an admin may still amend it and must
/// re-finalize the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftEntry {
    /// Assigned when the shift is finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntryId>,
    /// Business date of the shift.
    pub date: NaiveDate,
    /// Shift worked. `None` until someone logs in.
    #[serde(with = "optional_shift", default)]
    pub shift: Option<ShiftKind>,
    /// Username of the worker.
    #[serde(default)]
    pub user: String,
    /// Till sales for the shift.
    #[serde(with = "lenient_amount", default)]
    pub sales: Decimal,
    /// Expense lines. The first is normally the fixed daily line.
    #[serde(default)]
    pub expenses: Vec<ExpenseLine>,
    /// Set once a daily report covers this entry.
    #[serde(default)]
    pub is_daily_finalized: bool,
}

impl ShiftEntry {
    /// The empty working entry: zero sales and an empty fixed daily line.
    #[must_use]
    pub fn blank(date: NaiveDate) -> Self {
        Self {
            id: None,
            date,
            shift: None,
            user: String::new(),
            sales: Decimal::ZERO,
            expenses: vec![ExpenseLine::fixed_daily()],
            is_daily_finalized: false,
        }
    }

    /// A fresh entry for a worker's shift.
    #[must_use]
    pub fn for_worker(date: NaiveDate, user: impl Into<String>, shift: ShiftKind) -> Self {
        Self {
            user: user.into(),
            shift: Some(shift),
            ..Self::blank(date)
        }
    }

    /// Sum of every expense line amount.
    #[must_use]
    pub fn total_expenses(&self) -> Decimal {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    /// Sales minus expenses.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.sales - self.total_expenses()
    }

    /// Returns true if nothing has been recorded yet.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.sales.is_zero() && !self.expenses.iter().any(ExpenseLine::has_amount)
    }

    /// Finds a line by its key.
    #[must_use]
    pub fn expense(&self, key: &str) -> Option<&ExpenseLine> {
        self.expenses.iter().find(|e| e.key() == key)
    }

    /// Records a new expense line stamped with this entry's shift and user.
    ///
    /// Sales grow by the amount, matching how the till is counted.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::IncompleteExpense` if the item is blank or the
    /// amount is zero.
    pub fn add_expense(
        &mut self,
        item: &str,
        amount: Decimal,
    ) -> Result<&ExpenseLine, LedgerError> {
        let item = require_complete(item, amount)?;
        let line = ExpenseLine::ad_hoc(item, amount, self.shift_label(), self.user_name());
        self.sales += amount;
        self.expenses.push(line);
        self.expenses.last().ok_or(LedgerError::IncompleteExpense)
    }

    /// Replaces a line's item and amount; sales move by the difference.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::IncompleteExpense` for a blank item or zero
    /// amount, and `LedgerError::ExpenseNotFound` for an unknown key.
    pub fn edit_expense(
        &mut self,
        key: &str,
        item: &str,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let item = require_complete(item, amount)?;
        let shift_label = self.shift_label();
        let user_name = self.user_name();
        let line = self
            .expenses
            .iter_mut()
            .find(|e| e.key() == key)
            .ok_or_else(|| LedgerError::ExpenseNotFound(key.to_string()))?;

        let diff = amount - line.amount;
        line.item = item.to_string();
        line.amount = amount;
        if line.shift_name.is_none() {
            line.shift_name = shift_label;
        }
        if line.user_name.is_none() {
            line.user_name = user_name;
        }
        self.sales += diff;
        Ok(())
    }

    /// Removes an ad-hoc line; sales shrink by its amount, floored at zero.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::FixedLineRemoval` for the fixed daily line and
    /// `LedgerError::ExpenseNotFound` for an unknown key.
    pub fn remove_expense(&mut self, key: &str) -> Result<ExpenseLine, LedgerError> {
        let index = self
            .expenses
            .iter()
            .position(|e| e.key() == key)
            .ok_or_else(|| LedgerError::ExpenseNotFound(key.to_string()))?;
        if self.expenses[index].is_fixed() {
            return Err(LedgerError::FixedLineRemoval);
        }
        let line = self.expenses.remove(index);
        self.sales = (self.sales - line.amount).max(Decimal::ZERO);
        Ok(line)
    }

    fn shift_label(&self) -> Option<String> {
        self.shift.map(|s| s.label().to_string())
    }

    fn user_name(&self) -> Option<String> {
        (!self.user.is_empty()).then(|| self.user.clone())
    }
}

fn require_complete(item: &str, amount: Decimal) -> Result<&str, LedgerError> {
    let item = item.trim();
    if item.is_empty() || amount.is_zero() {
        return Err(LedgerError::IncompleteExpense);
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn test_blank_entry() {
        let entry = ShiftEntry::blank(day());
        assert!(entry.is_blank());
        assert_eq!(entry.expenses.len(), 1);
        assert!(entry.expenses[0].is_fixed());
        assert_eq!(entry.shift, None);
    }

    #[test]
    fn test_blank_entry_wire_form() {
        let json = serde_json::to_value(ShiftEntry::blank(day())).unwrap();
        assert_eq!(json["date"], "2025-06-10");
        assert_eq!(json["shift"], "");
        assert_eq!(json["sales"], "0");
        assert_eq!(json["isDailyFinalized"], false);
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_reads_legacy_entry() {
        let raw = r#"{
            "id": 1767798443000,
            "date": "2025-06-10",
            "shift": "صباحي",
            "user": "medhat",
            "sales": 1200,
            "expenses": [
                {"id": "fixed-daily", "item": "اليوميات", "amount": "150"},
                {"id": 1767798450000, "item": "ليمون", "amount": 40, "shiftName": "صباحي", "userName": "medhat"}
            ]
        }"#;
        let entry: ShiftEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.id, Some(EntryId(1_767_798_443_000)));
        assert_eq!(entry.shift, Some(ShiftKind::Morning));
        assert_eq!(entry.total_expenses(), dec!(190));
        assert_eq!(entry.net(), dec!(1010));
        assert!(!entry.is_daily_finalized);
    }

    #[test]
    fn test_add_expense_grows_sales() {
        let mut entry = ShiftEntry::for_worker(day(), "medhat", ShiftKind::Morning);
        let line = entry.add_expense("لبن", dec!(60)).unwrap().clone();
        assert_eq!(entry.sales, dec!(60));
        assert_eq!(line.shift_name.as_deref(), Some("صباحي"));
        assert_eq!(line.user_name.as_deref(), Some("medhat"));
        assert_eq!(entry.expenses.len(), 2);
    }

    #[test]
    fn test_add_expense_requires_item_and_amount() {
        let mut entry = ShiftEntry::blank(day());
        assert_eq!(
            entry.add_expense("  ", dec!(10)).unwrap_err(),
            LedgerError::IncompleteExpense
        );
        assert_eq!(
            entry.add_expense("لبن", Decimal::ZERO).unwrap_err(),
            LedgerError::IncompleteExpense
        );
        assert!(entry.is_blank());
    }

    #[test]
    fn test_edit_expense_adjusts_by_difference() {
        let mut entry = ShiftEntry::for_worker(day(), "abdo", ShiftKind::Evening);
        entry.sales = dec!(500);
        let key = entry.add_expense("عصير", dec!(40)).unwrap().key();
        entry.edit_expense(&key, "عصير برتقال", dec!(25)).unwrap();
        assert_eq!(entry.sales, dec!(525));
        let line = entry.expense(&key).unwrap();
        assert_eq!(line.item, "عصير برتقال");
        assert_eq!(line.amount, dec!(25));
    }

    #[test]
    fn test_edit_fixed_line_fills_shift_and_user() {
        let mut entry = ShiftEntry::for_worker(day(), "adham", ShiftKind::Night);
        entry.edit_expense("fixed-daily", "اليوميات", dec!(150)).unwrap();
        assert_eq!(entry.sales, dec!(150));
        assert_eq!(entry.expenses[0].shift_name.as_deref(), Some("ليلي"));
        assert_eq!(entry.expenses[0].user_name.as_deref(), Some("adham"));
    }

    #[test]
    fn test_edit_unknown_line() {
        let mut entry = ShiftEntry::blank(day());
        assert!(matches!(
            entry.edit_expense("42", "x", dec!(1)),
            Err(LedgerError::ExpenseNotFound(_))
        ));
    }

    #[test]
    fn test_remove_expense_floors_sales() {
        let mut entry = ShiftEntry::for_worker(day(), "medhat", ShiftKind::Morning);
        let key = entry.add_expense("صيانة", dec!(80)).unwrap().key();
        entry.sales = dec!(30);
        let removed = entry.remove_expense(&key).unwrap();
        assert_eq!(removed.amount, dec!(80));
        assert_eq!(entry.sales, Decimal::ZERO);
        assert_eq!(entry.expenses.len(), 1);
    }

    #[test]
    fn test_fixed_line_cannot_be_removed() {
        let mut entry = ShiftEntry::blank(day());
        assert_eq!(
            entry.remove_expense("fixed-daily").unwrap_err(),
            LedgerError::FixedLineRemoval
        );
        assert_eq!(entry.expenses.len(), 1);
    }
}
