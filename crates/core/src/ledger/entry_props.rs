//! Property-based tests for working-entry edits.
//!
//! Feature: shift-ledger, Property 1: Sales Track Expense Edits

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::entry::ShiftEntry;
use super::types::ShiftKind;

/// Strategy to generate a positive amount from 0.01 to 10,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn fresh_entry(sales: Decimal) -> ShiftEntry {
    let mut entry = ShiftEntry::for_worker(
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
        "medhat",
        ShiftKind::Morning,
    );
    entry.sales = sales;
    entry
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1.1: Adding then removing a line restores sales.
    #[test]
    fn prop_add_then_remove_restores_sales(
        sales in positive_amount(),
        amount in positive_amount(),
    ) {
        let mut entry = fresh_entry(sales);
        let key = entry.add_expense("ليمون", amount).unwrap().key();
        prop_assert_eq!(entry.sales, sales + amount);

        entry.remove_expense(&key).unwrap();
        prop_assert_eq!(entry.sales, sales);
        prop_assert_eq!(entry.expenses.len(), 1);
    }

    /// Property 1.2: Editing moves sales by exactly the difference.
    #[test]
    fn prop_edit_moves_sales_by_difference(
        sales in positive_amount(),
        before in positive_amount(),
        after in positive_amount(),
    ) {
        let mut entry = fresh_entry(sales);
        let key = entry.add_expense("عصير", before).unwrap().key();
        entry.edit_expense(&key, "عصير", after).unwrap();
        prop_assert_eq!(entry.sales, sales + after);
        prop_assert_eq!(entry.total_expenses(), after);
    }

    /// Property 1.3: Sales never go negative on removal.
    #[test]
    fn prop_removal_never_negative(
        amount in positive_amount(),
        shrink in positive_amount(),
    ) {
        let mut entry = fresh_entry(Decimal::ZERO);
        let key = entry.add_expense("صيانة", amount).unwrap().key();
        entry.sales -= shrink.min(entry.sales);
        entry.remove_expense(&key).unwrap();
        prop_assert!(entry.sales >= Decimal::ZERO);
    }
}
