use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use serde::Serialize;

use crate::date_util::DateInput;
use crate::error::Result;
use crate::metrics::{
    compute_category_breakdown, compute_changes, compute_period_stats, CategoryBreakdown,
    PeriodStats, StatChanges,
};
use crate::query::period::{parse_anchor, ReportPeriod};
use crate::storage::Database;

/// A period's stats next to the period before it.
///
/// Boundaries are reported closed: `*_end` is the last instant of the
/// window's last day.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodComparison {
    pub period_key: String,
    pub current_start: NaiveDateTime,
    pub current_end: NaiveDateTime,
    pub previous_start: NaiveDateTime,
    pub previous_end: NaiveDateTime,
    pub current: PeriodStats,
    pub previous: PeriodStats,
    pub changes: StatChanges,
    pub category_breakdown: Vec<CategoryBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub report_date: NaiveDate,
    #[serde(flatten)]
    pub comparison: PeriodComparison,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyReport {
    pub report_date: NaiveDate,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    #[serde(flatten)]
    pub comparison: PeriodComparison,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub report_date: NaiveDate,
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    #[serde(flatten)]
    pub comparison: PeriodComparison,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Report for the day containing `anchor` (default today) against the day before.
pub async fn generate_daily_report(
    db: &Database,
    anchor: Option<&DateInput>,
) -> Result<DailyReport> {
    daily_report_at(db, anchor, today()).await
}

/// Report for the Monday-to-Sunday week containing `anchor`.
pub async fn generate_weekly_report(
    db: &Database,
    anchor: Option<&DateInput>,
) -> Result<WeeklyReport> {
    weekly_report_at(db, anchor, today()).await
}

/// Report for the calendar month containing `anchor`. A bare `YYYY-MM`
/// anchor selects that month.
pub async fn generate_monthly_report(
    db: &Database,
    anchor: Option<&DateInput>,
) -> Result<MonthlyReport> {
    monthly_report_at(db, anchor, today()).await
}

pub(crate) async fn daily_report_at(
    db: &Database,
    anchor: Option<&DateInput>,
    today: NaiveDate,
) -> Result<DailyReport> {
    let report_date = parse_anchor(anchor, today)?;
    let comparison = compare(db, ReportPeriod::daily(report_date)).await?;
    Ok(DailyReport {
        report_date,
        comparison,
    })
}

pub(crate) async fn weekly_report_at(
    db: &Database,
    anchor: Option<&DateInput>,
    today: NaiveDate,
) -> Result<WeeklyReport> {
    let report_date = parse_anchor(anchor, today)?;
    let period = ReportPeriod::weekly(report_date);
    let (week_start, week_end) = period.date_range();
    let comparison = compare(db, period).await?;
    Ok(WeeklyReport {
        report_date,
        week_start,
        week_end,
        comparison,
    })
}

pub(crate) async fn monthly_report_at(
    db: &Database,
    anchor: Option<&DateInput>,
    today: NaiveDate,
) -> Result<MonthlyReport> {
    let report_date = parse_anchor(anchor, today)?;
    let period = ReportPeriod::monthly(report_date);
    let (month_start, month_end) = period.date_range();
    let comparison = compare(db, period).await?;
    Ok(MonthlyReport {
        report_date,
        month_start,
        month_end,
        comparison,
    })
}

async fn compare(db: &Database, period: ReportPeriod) -> Result<PeriodComparison> {
    let current_window = period.window();
    let previous_window = period.previous().window();
    debug!(
        "report {period}: current [{}, {}), previous [{}, {})",
        current_window.start_key(),
        current_window.end_key(),
        previous_window.start_key(),
        previous_window.end_key()
    );

    let (current, previous, category_breakdown) = db
        .reader()
        .call(move |conn| {
            let current = compute_period_stats(conn, &current_window)?;
            let previous = compute_period_stats(conn, &previous_window)?;
            let breakdown = compute_category_breakdown(conn, &current_window)?;
            Ok::<_, rusqlite::Error>((current, previous, breakdown))
        })
        .await?;

    Ok(PeriodComparison {
        period_key: period.to_key(),
        current_start: current_window.start,
        current_end: current_window.last_instant(),
        previous_start: previous_window.start,
        previous_end: previous_window.last_instant(),
        changes: compute_changes(&current, &previous),
        current,
        previous,
        category_breakdown,
    })
}
