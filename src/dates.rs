//! Calendar-day helpers shared by every calculator.
//!
//! Nothing in here reads the system clock. Callers pass `today` and the
//! user's time zone so results are reproducible.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;

pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";
pub const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid date range: start {start} is after end {end}")]
pub struct InvalidRangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Inclusive range of calendar days with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidRangeError> {
        if start > end {
            return Err(InvalidRangeError { start, end });
        }

        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// The `days` calendar days ending at `end`, inclusive. Zero is treated as one.
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: shift_days(end, -span),
            end,
        }
    }

    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year, 12, 31)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?.pred_opt()?
        };

        Some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn len_days(&self) -> i64 {
        days_between(self.start, self.end) + 1
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

pub fn local_date<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// `YYYY-MM-DD` of the local calendar day the instant falls on.
pub fn day_key<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> String {
    date_key(local_date(instant, tz))
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

pub fn parse_day_key(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DAY_KEY_FORMAT)
        .with_context(|| format!("Invalid date format: {input}. Example: 2024-06-05"))
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAY_NAMES[date.weekday().num_days_from_monday() as usize]
}

pub fn is_same_calendar_day<Tz: TimeZone>(a: &DateTime<Utc>, b: &DateTime<Utc>, tz: &Tz) -> bool {
    local_date(a, tz) == local_date(b, tz)
}

pub fn is_today(date: NaiveDate, today: NaiveDate) -> bool {
    date == today
}

pub fn is_tomorrow(date: NaiveDate, today: NaiveDate) -> bool {
    today.succ_opt() == Some(date)
}

pub fn is_past(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}

/// `date` moved by `days`, clamped to the first or last representable day.
pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(if days < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

/// Signed number of calendar days from `a` to `b`.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    b.signed_duration_since(a).num_days()
}

pub fn enumerate_days(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, InvalidRangeError> {
    Ok(DateRange::new(start, end)?.days().collect())
}

/// Half-open UTC interval `[start, end)` covering the local calendar day.
pub fn day_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let next_day = date
        .succ_opt()
        .with_context(|| format!("No calendar day after {date}"))?;

    Ok((local_day_start(date, tz)?, local_day_start(next_day, tz)?))
}

fn local_day_start<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Failed to build midnight for {date}"))?;

    // Zones that skip midnight on a DST switch start the day an hour later.
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|start| start.with_timezone(&Utc))
        .with_context(|| format!("Failed to convert start of {date} to local time"))
}
