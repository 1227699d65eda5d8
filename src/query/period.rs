use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;

use crate::date_util::{last_day_of_month, DateInput, Window};
use crate::error::{Error, Result};

static RE_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})$").unwrap());

/// The calendar span a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Day(NaiveDate),
    /// ISO week, identified by its Monday.
    Week(NaiveDate),
    Month(i32, u32),
}

impl ReportPeriod {
    pub fn daily(anchor: NaiveDate) -> Self {
        ReportPeriod::Day(anchor)
    }

    /// The Monday-to-Sunday week containing `anchor`.
    pub fn weekly(anchor: NaiveDate) -> Self {
        let offset = anchor.weekday().num_days_from_monday() as i64;
        ReportPeriod::Week(anchor - Duration::days(offset))
    }

    pub fn monthly(anchor: NaiveDate) -> Self {
        ReportPeriod::Month(anchor.year(), anchor.month())
    }

    /// Canonical key: `2025-06-15`, `2025-W24`, or `2025-06`.
    pub fn to_key(&self) -> String {
        match self {
            ReportPeriod::Day(d) => d.format("%Y-%m-%d").to_string(),
            ReportPeriod::Week(monday) => {
                let iw = monday.iso_week();
                format!("{}-W{:02}", iw.year(), iw.week())
            }
            ReportPeriod::Month(y, m) => format!("{y}-{m:02}"),
        }
    }

    /// Get the date range (inclusive start, inclusive end) for this period.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        match self {
            ReportPeriod::Day(d) => (*d, *d),
            ReportPeriod::Week(monday) => (*monday, *monday + Duration::days(6)),
            ReportPeriod::Month(y, m) => (
                NaiveDate::from_ymd_opt(*y, *m, 1).unwrap(),
                last_day_of_month(*y, *m),
            ),
        }
    }

    pub fn window(&self) -> Window {
        let (start, end) = self.date_range();
        Window::from_dates(start, end)
    }

    /// The immediately preceding period of the same kind. Months may differ
    /// in length from the current one.
    pub fn previous(&self) -> Self {
        match self {
            ReportPeriod::Day(d) => ReportPeriod::Day(*d - Duration::days(1)),
            ReportPeriod::Week(monday) => ReportPeriod::Week(*monday - Duration::days(7)),
            ReportPeriod::Month(y, m) => {
                if *m == 1 {
                    ReportPeriod::Month(y - 1, 12)
                } else {
                    ReportPeriod::Month(*y, m - 1)
                }
            }
        }
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

/// Resolve a report anchor date.
///
/// Absent or blank input means `today`. Text is `YYYY-MM-DD`, or a bare
/// `YYYY-MM` which resolves to the first of that month.
pub fn parse_anchor(input: Option<&DateInput>, today: NaiveDate) -> Result<NaiveDate> {
    let text = match input {
        None => return Ok(today),
        Some(DateInput::Date(d)) => return Ok(*d),
        Some(DateInput::DateTime(dt)) => return Ok(dt.date()),
        Some(DateInput::Text(s)) => s.trim(),
    };
    if text.is_empty() {
        return Ok(today);
    }

    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(d);
    }

    if let Some(caps) = RE_MONTH.captures(text) {
        let first = match (caps[1].parse::<i32>(), caps[2].parse::<u32>()) {
            (Ok(year), Ok(month)) => NaiveDate::from_ymd_opt(year, month, 1),
            _ => None,
        };
        if let Some(first) = first {
            return Ok(first);
        }
    }

    Err(Error::Validation(format!(
        "invalid report date '{text}', use YYYY-MM-DD or YYYY-MM"
    )))
}
