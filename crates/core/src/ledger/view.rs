//! Manager views over a day's shift entries.

use std::collections::{BTreeSet, HashSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use shiftbook_shared::types::EntryId;

use super::entry::ShiftEntry;
use super::expense::{ExpenseLine, ExpenseLineId, FIXED_DAILY_ITEM};
use super::types::ShiftKind;
use crate::reports::DailyReport;

/// Item label of the line rebuilt from an archived daily report.
pub const ARCHIVED_EXPENSES_ITEM: &str = "إجمالي مصاريف سابق";

/// Merges every shift entry of one date into a single admin entry.
///
/// Lines get a view key of `fixed-daily-<shift>` or `<id>-<shift>-<idx>` so
/// they stay unique across shifts; their original id is kept. The merged
/// entry counts as finalized if any source entry is. Returns `None` if the
/// date has no entries.
#[must_use]
pub fn merged_entry(entries: &[ShiftEntry], date: NaiveDate, viewer: &str) -> Option<ShiftEntry> {
    let day: Vec<&ShiftEntry> = entries.iter().filter(|e| e.date == date).collect();
    let first = day.first()?;

    let mut seen = HashSet::new();
    let mut expenses = Vec::new();
    for (entry_idx, entry) in day.iter().enumerate() {
        let shift = entry.shift.map_or("", ShiftKind::label);
        for (idx, line) in entry.expenses.iter().enumerate() {
            let mut key = match line.id {
                ExpenseLineId::Fixed => format!("fixed-daily-{shift}"),
                ExpenseLineId::AdHoc(stamp) => format!("{stamp}-{shift}-{idx}"),
            };
            if !seen.insert(key.clone()) {
                key = format!("{key}-{entry_idx}");
                seen.insert(key.clone());
            }
            expenses.push(ExpenseLine {
                view_key: Some(key),
                shift_name: Some(shift.to_string()),
                user_name: Some(entry.user.clone()),
                ..line.clone()
            });
        }
    }

    Some(ShiftEntry {
        id: first.id,
        date,
        shift: Some(ShiftKind::Admin),
        user: viewer.to_string(),
        sales: day.iter().map(|e| e.sales).sum(),
        expenses,
        is_daily_finalized: day.iter().any(|e| e.is_daily_finalized),
    })
}

/// Builds the admin working entry for a date.
///
/// Prefers the merged shift entries. A date with only an archived daily
/// report gets an entry rebuilt from the report's totals. Otherwise the admin
/// starts a fresh entry.
#[must_use]
pub fn merge_day_view(
    entries: &[ShiftEntry],
    daily: &[DailyReport],
    date: NaiveDate,
    viewer: &str,
) -> ShiftEntry {
    if let Some(merged) = merged_entry(entries, date, viewer) {
        return merged;
    }

    if let Some(report) = daily.iter().find(|r| r.date == date) {
        let finalized_by = if report.finalized_by.is_empty() {
            "System".to_string()
        } else {
            report.finalized_by.clone()
        };
        return ShiftEntry {
            id: Some(EntryId::new()),
            date,
            shift: Some(ShiftKind::Admin),
            user: finalized_by,
            sales: report.sales,
            expenses: vec![ExpenseLine {
                item: ARCHIVED_EXPENSES_ITEM.to_string(),
                amount: report.expenses,
                ..ExpenseLine::fixed_daily()
            }],
            is_daily_finalized: true,
        };
    }

    ShiftEntry::for_worker(date, viewer, ShiftKind::Admin)
}

/// Dates a manager can pick for daily closing, newest first.
///
/// Today plus every entry and report date in today's calendar month.
#[must_use]
pub fn available_dates(
    entries: &[ShiftEntry],
    daily: &[DailyReport],
    today: NaiveDate,
) -> Vec<NaiveDate> {
    let same_month = |d: &NaiveDate| d.year() == today.year() && d.month() == today.month();

    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
    dates.insert(today);
    dates.extend(entries.iter().map(|e| e.date).filter(same_month));
    dates.extend(daily.iter().map(|r| r.date).filter(same_month));
    dates.into_iter().rev().collect()
}

/// Per-item expense breakdown for a date, as shown on the manager dashboard.
///
/// The fixed line is always listed under its own label; other items only
/// when they carry an amount. Falls back to the archived report total.
#[must_use]
pub fn expense_breakdown(
    entries: &[ShiftEntry],
    daily: &[DailyReport],
    date: NaiveDate,
) -> Vec<(String, Decimal)> {
    const ARCHIVED_LABEL: &str = "مصروفات عامة (مؤرشفة)";

    let mut breakdown: Vec<(String, Decimal)> = Vec::new();
    let mut found = false;
    for entry in entries.iter().filter(|e| e.date == date) {
        found = true;
        for line in &entry.expenses {
            if !line.is_fixed() && !line.has_amount() {
                continue;
            }
            let label = if line.is_fixed() {
                FIXED_DAILY_ITEM
            } else {
                line.item.as_str()
            };
            match breakdown.iter_mut().find(|(item, _)| item == label) {
                Some((_, total)) => *total += line.amount,
                None => breakdown.push((label.to_string(), line.amount)),
            }
        }
    }

    if !found
        && let Some(report) = daily.iter().find(|r| r.date == date)
    {
        breakdown.push((ARCHIVED_LABEL.to_string(), report.expenses));
    }
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn day_entries() -> Vec<ShiftEntry> {
        let mut morning = ShiftEntry::for_worker(date("2025-06-10"), "medhat", ShiftKind::Morning);
        morning.id = Some(EntryId(1));
        morning.sales = dec!(100);
        morning.add_expense("لبن", dec!(30)).unwrap();
        let mut evening = ShiftEntry::for_worker(date("2025-06-10"), "abdo", ShiftKind::Evening);
        evening.id = Some(EntryId(2));
        evening.sales = dec!(200);
        evening.is_daily_finalized = true;
        let other = ShiftEntry::for_worker(date("2025-06-11"), "adham", ShiftKind::Night);
        vec![morning, evening, other]
    }

    #[test]
    fn test_merged_entry_combines_shifts() {
        let merged = merged_entry(&day_entries(), date("2025-06-10"), "admin").unwrap();
        assert_eq!(merged.id, Some(EntryId(1)));
        assert_eq!(merged.shift, Some(ShiftKind::Admin));
        assert_eq!(merged.user, "admin");
        assert_eq!(merged.sales, dec!(330));
        assert_eq!(merged.expenses.len(), 3);
        assert!(merged.is_daily_finalized);

        let keys: Vec<String> = merged.expenses.iter().map(ExpenseLine::key).collect();
        assert_eq!(keys[0], "fixed-daily-صباحي");
        assert!(keys[1].ends_with("-صباحي-1"));
        assert_eq!(keys[2], "fixed-daily-مسائي");
        assert!(merged.expenses[0].is_fixed());
        assert_eq!(merged.expenses[2].user_name.as_deref(), Some("abdo"));
    }

    #[test]
    fn test_merged_keys_stay_unique_for_repeated_shifts() {
        let mut entries = day_entries();
        entries[1].shift = Some(ShiftKind::Morning);
        let merged = merged_entry(&entries, date("2025-06-10"), "admin").unwrap();
        let keys: HashSet<String> = merged.expenses.iter().map(ExpenseLine::key).collect();
        assert_eq!(keys.len(), merged.expenses.len());
    }

    #[test]
    fn test_day_view_falls_back_to_report() {
        let report = DailyReport {
            date: date("2025-05-20"),
            sales: dec!(900),
            expenses: dec!(120),
            net: dec!(780),
            shift_count: 3,
            finalized_by: String::new(),
            updated_at: None,
        };
        let view = merge_day_view(&day_entries(), &[report], date("2025-05-20"), "admin");
        assert_eq!(view.user, "System");
        assert_eq!(view.sales, dec!(900));
        assert_eq!(view.total_expenses(), dec!(120));
        assert_eq!(view.expenses[0].item, ARCHIVED_EXPENSES_ITEM);
        assert!(view.expenses[0].is_fixed());
        assert!(view.is_daily_finalized);
    }

    #[test]
    fn test_day_view_for_new_day() {
        let view = merge_day_view(&day_entries(), &[], date("2025-06-20"), "admin");
        assert!(view.is_blank());
        assert_eq!(view.shift, Some(ShiftKind::Admin));
        assert_eq!(view.user, "admin");
        assert!(!view.is_daily_finalized);
    }

    #[test]
    fn test_available_dates() {
        let mut entries = day_entries();
        entries.push(ShiftEntry::blank(date("2025-05-31")));
        let report = DailyReport {
            date: date("2025-06-02"),
            sales: Decimal::ZERO,
            expenses: Decimal::ZERO,
            net: Decimal::ZERO,
            shift_count: 0,
            finalized_by: "admin".to_string(),
            updated_at: None,
        };
        let dates = available_dates(&entries, &[report], date("2025-06-15"));
        assert_eq!(
            dates,
            vec![
                date("2025-06-15"),
                date("2025-06-11"),
                date("2025-06-10"),
                date("2025-06-02")
            ]
        );
    }

    #[test]
    fn test_expense_breakdown() {
        let mut entries = day_entries();
        entries[1].add_expense("لبن", dec!(15)).unwrap();
        let breakdown = expense_breakdown(&entries, &[], date("2025-06-10"));
        assert_eq!(
            breakdown,
            vec![
                ("اليوميات".to_string(), Decimal::ZERO),
                ("لبن".to_string(), dec!(45)),
            ]
        );
    }
}
