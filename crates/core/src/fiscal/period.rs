//! Fiscal month type.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::FiscalError;

/// Day of the calendar month on which a fiscal month starts.
pub const FISCAL_MONTH_START_DAY: u32 = 6;

/// A fiscal month, identified by the calendar month it starts in.
///
/// `2025-01` covers 2025-01-06 through 2025-02-05 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiscalMonth {
    /// Always the 6th of a calendar month.
    start: NaiveDate,
}

impl FiscalMonth {
    /// Creates a fiscal month from its year and starting calendar month.
    ///
    /// # Errors
    ///
    /// Returns `FiscalError::InvalidMonth` if the month is not 1-12 or the
    /// year is outside 1..=9999.
    pub fn new(year: i32, month: u32) -> Result<Self, FiscalError> {
        if !(1..=9999).contains(&year) {
            return Err(FiscalError::InvalidMonth(format!("{year}-{month:02}")));
        }
        NaiveDate::from_ymd_opt(year, month, FISCAL_MONTH_START_DAY)
            .map(|start| Self { start })
            .ok_or_else(|| FiscalError::InvalidMonth(format!("{year}-{month:02}")))
    }

    /// Returns the fiscal month a calendar date belongs to.
    ///
    /// Days 1-5 belong to the previous calendar month's fiscal month.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        let anchor = if date.day() < FISCAL_MONTH_START_DAY {
            date - Months::new(1)
        } else {
            date
        };
        // Step back to the last day of the previous month, then forward to the 6th.
        let start = anchor - Days::new(u64::from(anchor.day()))
            + Days::new(u64::from(FISCAL_MONTH_START_DAY));
        Self { start }
    }

    /// Returns the fiscal month containing the given wall-clock instant.
    #[must_use]
    pub fn current(now: NaiveDateTime) -> Self {
        Self::of(now.date())
    }

    /// Calendar year of the starting month.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// Starting calendar month (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.start.month()
    }

    /// First day of the fiscal month (the 6th).
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the fiscal month (the 5th of the next calendar month).
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.start + Months::new(1) - Days::new(1)
    }

    /// The instant the fiscal window closes: the end date at 23:59:59.
    #[must_use]
    pub fn closes_at(&self) -> NaiveDateTime {
        (self.end() + Days::new(1)).and_time(NaiveTime::MIN) - TimeDelta::seconds(1)
    }

    /// Returns true if the date falls inside the fiscal window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }

    /// Returns true once the window has closed and the month may be finalized.
    #[must_use]
    pub fn can_close_at(&self, now: NaiveDateTime) -> bool {
        now >= self.closes_at()
    }

    /// The following fiscal month.
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            start: self.start + Months::new(1),
        }
    }

    /// The preceding fiscal month.
    #[must_use]
    pub fn previous(&self) -> Self {
        Self {
            start: self.start - Months::new(1),
        }
    }
}

impl fmt::Display for FiscalMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for FiscalMonth {
    type Err = FiscalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FiscalError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for FiscalMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FiscalMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Returns the fiscal month of a calendar date.
#[must_use]
pub fn fiscal_month_of(date: NaiveDate) -> FiscalMonth {
    FiscalMonth::of(date)
}

/// Parses a `YYYY-MM-DD` date, ignoring any trailing `T...` time part.
///
/// # Errors
///
/// Returns `FiscalError::InvalidDate` if the calendar part does not parse.
pub fn parse_date(s: &str) -> Result<NaiveDate, FiscalError> {
    let day = s.trim().split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| FiscalError::InvalidDate(s.to_string()))
}

/// String-level membership test used by report filters.
///
/// Unparseable input is never in any fiscal month.
#[must_use]
pub fn is_in_fiscal_month(date: &str, fiscal_month: &str) -> bool {
    match (parse_date(date), fiscal_month.parse::<FiscalMonth>()) {
        (Ok(date), Ok(month)) => month.contains(date),
        _ => false,
    }
}

/// Reads the shop's wall clock in its configured timezone.
///
/// Business dates and the month-close check use the local calendar; record
/// stamps use the same instant in UTC.
#[must_use]
pub fn local_now(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).expect("valid date")
    }

    fn month(s: &str) -> FiscalMonth {
        s.parse().expect("valid fiscal month")
    }

    #[rstest]
    #[case("2025-03-06", "2025-03")]
    #[case("2025-03-31", "2025-03")]
    #[case("2025-03-05", "2025-02")]
    #[case("2025-03-01", "2025-02")]
    #[case("2025-01-05", "2024-12")]
    #[case("2025-01-06", "2025-01")]
    #[case("2024-12-31", "2024-12")]
    #[case("2024-03-01", "2024-02")]
    fn test_fiscal_month_of(#[case] day: &str, #[case] expected: &str) {
        assert_eq!(fiscal_month_of(date(day)).to_string(), expected);
    }

    #[test]
    fn test_window_boundaries() {
        assert!(is_in_fiscal_month("2025-02-05", "2025-01"));
        assert!(!is_in_fiscal_month("2025-02-06", "2025-01"));
        assert!(is_in_fiscal_month("2025-01-06", "2025-01"));
        assert!(!is_in_fiscal_month("2025-01-05", "2025-01"));
        assert!(is_in_fiscal_month("2025-01-05", "2024-12"));
    }

    #[test]
    fn test_membership_rejects_garbage() {
        assert!(!is_in_fiscal_month("", "2025-01"));
        assert!(!is_in_fiscal_month("2025-01-10", ""));
        assert!(!is_in_fiscal_month("yesterday", "2025-01"));
        assert!(!is_in_fiscal_month("2025-01-10", "2025-13"));
    }

    #[test]
    fn test_membership_accepts_timestamps() {
        assert!(is_in_fiscal_month("2025-01-20T10:15:00.000Z", "2025-01"));
    }

    #[test]
    fn test_window_dates() {
        let m = month("2024-12");
        assert_eq!(m.start(), date("2024-12-06"));
        assert_eq!(m.end(), date("2025-01-05"));
        assert_eq!(m.closes_at(), date("2025-01-05").and_hms_opt(23, 59, 59).unwrap());
        assert_eq!(month("2024-01").end(), date("2024-02-05"));
    }

    #[test]
    fn test_can_close_at() {
        let m = month("2025-03");
        let closes = date("2025-04-05").and_hms_opt(23, 59, 59).unwrap();
        assert!(!m.can_close_at(closes - TimeDelta::seconds(1)));
        assert!(!m.can_close_at(date("2025-03-20").and_hms_opt(12, 0, 0).unwrap()));
        assert!(m.can_close_at(closes));
        assert!(m.can_close_at(date("2025-04-06").and_hms_opt(0, 0, 0).unwrap()));
    }

    #[test]
    fn test_next_and_previous_roll_years() {
        assert_eq!(month("2024-12").next(), month("2025-01"));
        assert_eq!(month("2025-01").previous(), month("2024-12"));
    }

    #[rstest]
    #[case("2025-1")]
    #[case("25-01")]
    #[case("2025/01")]
    #[case("2025-00")]
    #[case("2025-13")]
    #[case("abcd-ef")]
    fn test_invalid_months(#[case] raw: &str) {
        assert!(raw.parse::<FiscalMonth>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let m = month("2025-06");
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"2025-06\"");
        let back: FiscalMonth = serde_json::from_str("\"2025-06\"").unwrap();
        assert_eq!(back, m);
        assert!(serde_json::from_str::<FiscalMonth>("\"June\"").is_err());
    }
}
