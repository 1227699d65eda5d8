use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::error::{Error, Result};

/// Storage format for every timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get the last day of a given month.
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap() - Duration::days(1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap() - Duration::days(1)
    }
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// A date supplied by a caller, either already structured or as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl From<NaiveDate> for DateInput {
    fn from(d: NaiveDate) -> Self {
        DateInput::Date(d)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(dt: NaiveDateTime) -> Self {
        DateInput::DateTime(dt)
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Text(s)
    }
}

/// Normalize an optional date input.
///
/// Absent input and blank text both mean "unbounded". Text must be
/// `YYYY-MM-DD`; anything else is a validation error naming the value.
pub fn parse_date_input(input: Option<&DateInput>) -> Result<Option<NaiveDate>> {
    match input {
        None => Ok(None),
        Some(DateInput::Date(d)) => Ok(Some(*d)),
        Some(DateInput::DateTime(dt)) => Ok(Some(dt.date())),
        Some(DateInput::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Some).map_err(|_| {
                Error::Validation(format!("invalid date format '{s}', use YYYY-MM-DD"))
            })
        }
    }
}

/// A half-open datetime range `[start, end)`.
///
/// Built from whole days, so `start` is midnight of the first day and `end`
/// is midnight of the day after the last one. Day-level counts match a
/// closed range ending at the last instant of the last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    /// Window covering `first..=last` as whole days.
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            start: first.and_time(NaiveTime::MIN),
            end: (last + Duration::days(1)).and_time(NaiveTime::MIN),
        }
    }

    pub fn start_key(&self) -> String {
        format_timestamp(self.start)
    }

    pub fn end_key(&self) -> String {
        format_timestamp(self.end)
    }

    /// Last instant inside the window (the closed-range end).
    pub fn last_instant(&self) -> NaiveDateTime {
        self.end - Duration::microseconds(1)
    }
}
