//! Reconciliation of shift entries into daily and monthly reports.
//!
//! Every operation recomputes its figures from the source records and
//! replaces the stored report. Two managers finalizing the same day or month
//! therefore converge on the same figures whatever order their writes land in.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use super::error::ReconcileError;
use super::types::{
    DailyReport, DayFinalized, DayTotals, MonthFinalized, MonthTotals, MonthlyReport,
};
use crate::auth::SystemUser;
use crate::fiscal::FiscalMonth;
use crate::ledger::ShiftEntry;

/// Service for finalizing and reconciling reports.
pub struct ReportService;

impl ReportService {
    /// Sums sales and every expense line over a set of shift entries.
    #[must_use]
    pub fn day_totals<'a, I>(entries: I) -> DayTotals
    where
        I: IntoIterator<Item = &'a ShiftEntry>,
    {
        let mut totals = DayTotals::default();
        for entry in entries {
            totals.sales += entry.sales;
            totals.expenses += entry.total_expenses();
            totals.shift_count += 1;
        }
        totals.net = totals.sales - totals.expenses;
        totals
    }

    /// Sums a set of daily reports.
    #[must_use]
    pub fn month_totals<'a, I>(reports: I) -> MonthTotals
    where
        I: IntoIterator<Item = &'a DailyReport>,
    {
        let mut totals = MonthTotals::default();
        for report in reports {
            totals.sales += report.sales;
            totals.expenses += report.expenses;
            totals.days_count += 1;
        }
        totals.net = totals.sales - totals.expenses;
        totals
    }

    /// Daily reports whose date falls inside the fiscal month.
    pub fn daily_in_month(
        reports: &[DailyReport],
        month: FiscalMonth,
    ) -> impl Iterator<Item = &DailyReport> {
        reports.iter().filter(move |r| month.contains(r.date))
    }

    /// Finalizes a business date.
    ///
    /// Replaces any existing report for the date with one recomputed from the
    /// date's shift entries, and flags those entries as finalized.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Forbidden` for non-super actors and
    /// `ReconcileError::NothingToFinalize` when the date has no entries.
    pub fn finalize_day(
        entries: &mut [ShiftEntry],
        daily: &mut Vec<DailyReport>,
        date: NaiveDate,
        actor: &SystemUser,
        now: DateTime<Utc>,
    ) -> Result<DayFinalized, ReconcileError> {
        if !actor.role.can_finalize() {
            return Err(ReconcileError::Forbidden);
        }

        let totals = Self::day_totals(entries.iter().filter(|e| e.date == date));
        if totals.shift_count == 0 {
            return Err(ReconcileError::NothingToFinalize(date));
        }

        let report = DailyReport {
            date,
            sales: totals.sales,
            expenses: totals.expenses,
            net: totals.net,
            shift_count: totals.shift_count,
            finalized_by: actor.username.clone(),
            updated_at: Some(now),
        };

        let replaced = daily
            .iter()
            .position(|r| r.date == date)
            .map(|i| daily.remove(i));
        daily.retain(|r| r.date != date);
        daily.insert(0, report.clone());

        let mut newly_finalized = 0;
        for entry in entries.iter_mut().filter(|e| e.date == date) {
            if !entry.is_daily_finalized {
                entry.is_daily_finalized = true;
                newly_finalized += 1;
            }
        }

        info!(
            %date,
            sales = %report.sales,
            expenses = %report.expenses,
            shifts = report.shift_count,
            replaced = replaced.is_some(),
            finalized_by = %report.finalized_by,
            "day finalized"
        );

        Ok(DayFinalized {
            report,
            replaced,
            newly_finalized,
        })
    }

    /// Closes a fiscal month.
    ///
    /// `now` is the shop's wall clock; the month may be closed from 23:59:59
    /// on the 5th of the following calendar month.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Forbidden` for non-super actors,
    /// `ReconcileError::TooEarly` while the window is open and
    /// `ReconcileError::NothingToClose` when no daily reports fall inside it.
    pub fn finalize_month(
        daily: &[DailyReport],
        monthly: &mut Vec<MonthlyReport>,
        month: FiscalMonth,
        actor: &SystemUser,
        now: &DateTime<Tz>,
    ) -> Result<MonthFinalized, ReconcileError> {
        if !actor.role.can_finalize() {
            return Err(ReconcileError::Forbidden);
        }
        if !month.can_close_at(now.naive_local()) {
            return Err(ReconcileError::TooEarly {
                month,
                closes_at: month.closes_at(),
            });
        }

        let totals = Self::month_totals(Self::daily_in_month(daily, month));
        if totals.days_count == 0 {
            return Err(ReconcileError::NothingToClose(month));
        }

        let closed_at = now.with_timezone(&Utc);
        let report = MonthlyReport {
            month,
            sales: totals.sales,
            expenses: totals.expenses,
            net: totals.net,
            days_count: totals.days_count,
            finalized_by: actor.username.clone(),
            date: Some(closed_at),
            updated_at: None,
        };

        let replaced = monthly
            .iter()
            .position(|m| m.month == month)
            .map(|i| monthly.remove(i));
        monthly.retain(|m| m.month != month);
        monthly.insert(0, report.clone());

        info!(
            %month,
            sales = %report.sales,
            net = %report.net,
            days = report.days_count,
            replaced = replaced.is_some(),
            "month closed"
        );

        Ok(MonthFinalized { report, replaced })
    }

    /// Brings every closed month in line with the current daily reports.
    ///
    /// Reports whose figures already match are left untouched, so a pass
    /// over unchanged data writes nothing. An empty daily set is a reset in
    /// progress, not a month of zero sales, and leaves every month alone.
    /// Returns the months that changed.
    pub fn cascade_monthly(
        daily: &[DailyReport],
        monthly: &mut [MonthlyReport],
        now: DateTime<Utc>,
    ) -> Vec<FiscalMonth> {
        let mut changed = Vec::new();
        if daily.is_empty() {
            debug!("no daily reports, skipping cascade");
            return changed;
        }
        for report in monthly.iter_mut() {
            let totals = Self::month_totals(Self::daily_in_month(daily, report.month));
            if report.matches(&totals) {
                continue;
            }
            debug!(
                month = %report.month,
                old_net = %report.net,
                new_net = %totals.net,
                "monthly report out of date, recomputing"
            );
            report.sales = totals.sales;
            report.expenses = totals.expenses;
            report.net = totals.net;
            report.days_count = totals.days_count;
            report.updated_at = Some(now);
            changed.push(report.month);
        }
        if !changed.is_empty() {
            info!(months = changed.len(), "monthly reports reconciled");
        }
        changed
    }
}
