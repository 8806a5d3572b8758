//! Builders for the shift, day and month documents.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::document::{ExportCell, ExportDocument};
use super::error::ExportError;
use crate::books::Order;
use crate::fiscal::FiscalMonth;
use crate::ledger::{ExpenseLine, FIXED_DAILY_ITEM, ShiftEntry, ShiftKind};
use crate::reports::{DailyReport, ReportService};

const BRAND: &str = "TAKE ONE TEA";

fn shift_label(entry: &ShiftEntry) -> &'static str {
    entry.shift.map_or("", ShiftKind::label)
}

fn line_item(line: &ExpenseLine) -> String {
    if line.is_fixed() {
        FIXED_DAILY_ITEM.to_string()
    } else {
        line.item.clone()
    }
}

/// Lines shown in detailed expense tables: the fixed line always, others
/// only with an amount.
fn listed_lines(entry: &ShiftEntry) -> impl Iterator<Item = &ExpenseLine> {
    entry
        .expenses
        .iter()
        .filter(|line| line.is_fixed() || line.amount > Decimal::ZERO)
}

/// Detailed sheet for the working entry of one shift.
///
/// # Errors
///
/// Returns `ExportError::NothingToExport` for a blank entry.
pub fn shift_document(entry: &ShiftEntry) -> Result<ExportDocument, ExportError> {
    if entry.is_blank() {
        return Err(ExportError::NothingToExport(format!("shift on {}", entry.date)));
    }

    let total_expenses = entry.total_expenses();
    let rows: Vec<Vec<ExportCell>> = entry
        .expenses
        .iter()
        .filter(|line| line.has_amount())
        .enumerate()
        .map(|(idx, line)| vec![(idx + 1).into(), line.item.clone().into(), line.amount.into()])
        .collect();

    Ok(ExportDocument {
        title: format!("{BRAND} - تقرير الوردية التفصيلي"),
        filename: format!("T1T_Shift_{}_{}.xlsx", shift_label(entry), entry.date),
        summary: vec![
            ExportDocument::summary_item("إجمالي المبيعات", entry.sales),
            ExportDocument::summary_item("إجمالي المصروفات", total_expenses),
            ExportDocument::summary_item("صافي الربح", entry.sales - total_expenses),
        ],
        blocks: vec![ExportDocument::block(
            "تفاصيل مصروفات الوردية (الخوارج)",
            &["م", "البند / البيان", "المبلغ"],
            rows,
        )],
    })
}

/// Financial sheet for one business date over every shift recorded.
///
/// # Errors
///
/// Returns `ExportError::NothingToExport` when the date has no entries.
pub fn day_document(entries: &[ShiftEntry], date: NaiveDate) -> Result<ExportDocument, ExportError> {
    let day: Vec<&ShiftEntry> = entries.iter().filter(|e| e.date == date).collect();
    if day.is_empty() {
        return Err(ExportError::NothingToExport(format!("no shifts on {date}")));
    }
    let totals = ReportService::day_totals(day.iter().copied());

    let shifts: Vec<Vec<ExportCell>> = day
        .iter()
        .map(|e| {
            vec![
                e.user.clone().into(),
                shift_label(e).into(),
                e.sales.into(),
                e.total_expenses().into(),
                e.net().into(),
            ]
        })
        .collect();
    let lines: Vec<Vec<ExportCell>> = day
        .iter()
        .flat_map(|e| {
            listed_lines(e).map(move |line| {
                vec![
                    line_item(line).into(),
                    line.amount.into(),
                    shift_label(e).into(),
                    e.user.clone().into(),
                ]
            })
        })
        .collect();

    Ok(ExportDocument {
        title: format!("{BRAND} - التقرير المالي ليوم {date}"),
        filename: format!("T1T_Daily_Report_{date}.xlsx"),
        summary: vec![
            ExportDocument::summary_item("إجمالي مبيعات اليوم", totals.sales),
            ExportDocument::summary_item("إجمالي مصروفات اليوم", totals.expenses),
            ExportDocument::summary_item("صافي دخل اليوم", totals.net),
        ],
        blocks: vec![
            ExportDocument::block(
                "سجل الورديات المقفلة لهذا اليوم",
                &["الموظف", "الوردية", "المبيعات", "المصروفات", "الصافي"],
                shifts,
            ),
            ExportDocument::block(
                "كشف بنود الخوارج التفصيلية",
                &["البيان", "المبلغ", "الوردية", "المسؤول"],
                lines,
            ),
        ],
    })
}

/// Analysis sheet for a fiscal month.
///
/// Sales and expenses come from the month's daily reports; supplier orders
/// delivered in the window are deducted from the final net. The expense
/// breakdown and detail come from the shift entries in the window.
#[must_use]
pub fn month_document(
    month: FiscalMonth,
    daily: &[DailyReport],
    entries: &[ShiftEntry],
    orders: &[Order],
) -> ExportDocument {
    let mut days: Vec<&DailyReport> = ReportService::daily_in_month(daily, month).collect();
    days.sort_by(|a, b| b.date.cmp(&a.date));
    let totals = ReportService::month_totals(days.iter().copied());

    let month_orders: Vec<&Order> = orders.iter().filter(|o| month.contains(o.date)).collect();
    let orders_total: Decimal = month_orders.iter().map(|o| o.price).sum();

    let mut breakdown: Vec<(String, Decimal)> = Vec::new();
    let mut detail: Vec<(NaiveDate, Vec<ExportCell>)> = Vec::new();
    for entry in entries.iter().filter(|e| month.contains(e.date)) {
        for line in listed_lines(entry) {
            let item = line_item(line);
            match breakdown.iter_mut().find(|(name, _)| *name == item) {
                Some((_, total)) => *total += line.amount,
                None => breakdown.push((item.clone(), line.amount)),
            }
            detail.push((
                entry.date,
                vec![
                    entry.date.to_string().into(),
                    item.into(),
                    line.amount.into(),
                    shift_label(entry).into(),
                    entry.user.clone().into(),
                ],
            ));
        }
    }
    breakdown.sort_by(|a, b| b.1.cmp(&a.1));
    detail.sort_by_key(|(date, _)| *date);

    ExportDocument {
        title: format!("تقرير أداء شهر {month}"),
        filename: format!("T1T_Monthly_Analysis_{month}.xlsx"),
        summary: vec![
            ExportDocument::summary_item("إجمالي مبيعات الشهر", totals.sales),
            ExportDocument::summary_item("إجمالي خوارج اليوميات", totals.expenses),
            ExportDocument::summary_item("إجمالي مشتريات المخازن", orders_total),
            ExportDocument::summary_item("صافي الأرباح النهائى", totals.net - orders_total),
        ],
        blocks: vec![
            ExportDocument::block(
                "تحليل المصروفات (الخوارج) حسب النوع - مجمع",
                &["بند المصروف", "إجمالي الصرف الشهري"],
                breakdown
                    .into_iter()
                    .map(|(item, amount)| vec![item.into(), amount.into()])
                    .collect(),
            ),
            ExportDocument::block(
                "سجل الإيرادات اليومية المجمعة",
                &["التاريخ", "المبيعات", "الخوارج", "الصافي اليومي"],
                days.iter()
                    .map(|r| {
                        vec![
                            r.date.to_string().into(),
                            r.sales.into(),
                            r.expenses.into(),
                            r.net.into(),
                        ]
                    })
                    .collect(),
            ),
            ExportDocument::block(
                "بيان مشتريات المخازن (الطلبيات)",
                &["التاريخ", "البيان", "التاجر", "القيمة"],
                month_orders
                    .iter()
                    .map(|o| {
                        vec![
                            o.date.to_string().into(),
                            o.item.clone().into(),
                            o.supplier.clone().into(),
                            o.price.into(),
                        ]
                    })
                    .collect(),
            ),
            ExportDocument::block(
                "بيان الخوارج اليومية المفصلة (للشهر بالكامل)",
                &["التاريخ", "البيان", "المبلغ", "الوردية", "المسؤول"],
                detail.into_iter().map(|(_, row)| row).collect(),
            ),
        ],
    }
}
