//! Property-based tests for the fiscal month calendar.
//!
//! Feature: fiscal-calendar, Property 1: Month Attribution
//! Feature: fiscal-calendar, Property 2: Window Membership

use chrono::{Datelike, Days, NaiveDate};
use proptest::prelude::*;

use super::period::{FiscalMonth, fiscal_month_of, is_in_fiscal_month};

/// Strategy to generate any calendar date between 1990 and 2100.
fn any_date() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2100, 1u32..=12, 1u32..=31).prop_filter_map("valid calendar date", |(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d)
    })
}

/// Strategy to generate a date whose day of month lies in `days`.
///
/// Days up to 28 exist in every month, so nothing is rejected.
fn date_with_day(days: std::ops::RangeInclusive<u32>) -> impl Strategy<Value = NaiveDate> {
    (1990i32..2100, 1u32..=12, days)
        .prop_filter_map("valid calendar date", |(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
}

/// Strategy to generate a fiscal month between 1990 and 2100.
fn any_month() -> impl Strategy<Value = FiscalMonth> {
    (1990i32..2100, 1u32..=12).prop_map(|(y, m)| FiscalMonth::new(y, m).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property 1.1: Days 1-5 belong to the previous calendar month.
    ///
    /// *For any* date with day in [1, 5], the fiscal month SHALL be the
    /// previous calendar month, rolling the year back in January.
    #[test]
    fn prop_early_days_belong_to_previous_month(date in date_with_day(1..=5)) {
        let month = fiscal_month_of(date);
        if date.month() == 1 {
            prop_assert_eq!(month.year(), date.year() - 1);
            prop_assert_eq!(month.month(), 12);
        } else {
            prop_assert_eq!(month.year(), date.year());
            prop_assert_eq!(month.month(), date.month() - 1);
        }
    }

    /// Property 1.2: Days 6-31 belong to the current calendar month.
    #[test]
    fn prop_later_days_belong_to_current_month(date in date_with_day(6..=28)) {
        let month = fiscal_month_of(date);
        prop_assert_eq!(month.year(), date.year());
        prop_assert_eq!(month.month(), date.month());
    }

    /// Property 2.1: A date is inside exactly the fiscal month it maps to.
    #[test]
    fn prop_date_belongs_to_exactly_one_month(date in any_date()) {
        let own = fiscal_month_of(date);
        prop_assert!(own.contains(date));
        prop_assert!(!own.next().contains(date));
        prop_assert!(!own.previous().contains(date));

        let day = date.format("%Y-%m-%d").to_string();
        prop_assert!(is_in_fiscal_month(&day, &own.to_string()));
        prop_assert!(!is_in_fiscal_month(&day, &own.next().to_string()));
    }

    /// Property 2.2: Consecutive fiscal months tile the calendar.
    ///
    /// The day after a month's end is the next month's start.
    #[test]
    fn prop_windows_are_contiguous(month in any_month()) {
        prop_assert_eq!(month.end() + Days::new(1), month.next().start());
        prop_assert_eq!(month.start().day(), 6);
        prop_assert_eq!(month.end().day(), 5);
        prop_assert_eq!(fiscal_month_of(month.start()), month);
        prop_assert_eq!(fiscal_month_of(month.end()), month);
    }

    /// Property 2.3: The textual form round-trips.
    #[test]
    fn prop_display_parses_back(month in any_month()) {
        let parsed: FiscalMonth = month.to_string().parse().unwrap();
        prop_assert_eq!(parsed, month);
    }
}
