//! Store-backed operations shared by the CLI and the API.
//!
//! Each call loads a fresh snapshot for the user and hands it to the pure
//! calculators, so results always reflect the current store contents.

use crate::calendar::dashboard::{Dashboard, build_dashboard};
use crate::calendar::{CalendarDay, build_day_summaries, build_month_grid};
use crate::dates::{DateRange, day_bounds};
use crate::db::Database;
use crate::habits::{HabitProgress, summarize_habits};
use crate::model::HabitCompletion;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use tracing::info;

const MAX_CALENDAR_DAYS: i64 = 366;

/// Records a completion for `date`. Today uses `now`; other days are stamped
/// at local noon so the record stays on that day in any nearby zone.
pub fn mark_habit_done<Tz: TimeZone>(
    database: &Database,
    user_id: &str,
    habit_id: &str,
    date: NaiveDate,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<HabitCompletion> {
    let today = now.with_timezone(tz).date_naive();
    check_completion_date(date, today)?;

    let completed_at = if date == today {
        now
    } else {
        local_noon(date, tz)?
    };

    let completion = database.mark_habit_done(user_id, habit_id, completed_at)?;
    info!(habit_id = %habit_id, date = %date, "habit marked done");

    Ok(completion)
}

/// Removes every completion of the habit on `date`. Returns how many records went.
pub fn unmark_habit_day<Tz: TimeZone>(
    database: &Database,
    user_id: &str,
    habit_id: &str,
    date: NaiveDate,
    tz: &Tz,
) -> Result<usize> {
    let (from, to) = day_bounds(date, tz)?;
    let removed = database.unmark_habit_between(user_id, habit_id, from, to)?;
    info!(habit_id = %habit_id, date = %date, removed, "habit unmarked");

    Ok(removed)
}

pub fn habit_progress<Tz: TimeZone>(
    database: &Database,
    user_id: &str,
    today: NaiveDate,
    tz: &Tz,
) -> Result<Vec<HabitProgress>> {
    let habits = database.habits(user_id)?;
    let completions = database.completions(user_id)?;

    Ok(summarize_habits(&habits, &completions, today, tz))
}

pub fn calendar_range<Tz: TimeZone>(
    database: &Database,
    user_id: &str,
    range: DateRange,
    today: NaiveDate,
    tz: &Tz,
) -> Result<Vec<CalendarDay>> {
    check_calendar_range(range)?;

    let snapshot = database.snapshot(user_id)?;
    Ok(build_day_summaries(&snapshot, range, today, tz))
}

pub fn calendar_month<Tz: TimeZone>(
    database: &Database,
    user_id: &str,
    year: i32,
    month: u32,
    week_start: Weekday,
    today: NaiveDate,
    tz: &Tz,
) -> Result<Vec<CalendarDay>> {
    let snapshot = database.snapshot(user_id)?;
    build_month_grid(&snapshot, year, month, week_start, today, tz)
}

pub fn dashboard<Tz: TimeZone>(
    database: &Database,
    user_id: &str,
    today: NaiveDate,
    upcoming_days: u32,
    tz: &Tz,
) -> Result<Dashboard> {
    let snapshot = database.snapshot(user_id)?;
    Ok(build_dashboard(&snapshot, today, upcoming_days, tz))
}

pub fn check_completion_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date > today {
        bail!("Cannot complete a habit in the future: {date}");
    }

    Ok(())
}

pub fn check_calendar_range(range: DateRange) -> Result<()> {
    if range.len_days() > MAX_CALENDAR_DAYS {
        bail!(
            "Calendar range too long: {} days (max {MAX_CALENDAR_DAYS})",
            range.len_days()
        );
    }

    Ok(())
}

/// Parses `YYYY-MM` into year and month.
pub fn parse_month(input: &str) -> Result<(i32, u32)> {
    let (year, month) = input
        .trim()
        .split_once('-')
        .with_context(|| format!("Invalid month format: {input}. Example: 2024-06"))?;

    let year = year
        .parse::<i32>()
        .with_context(|| format!("Invalid year in month: {input}"))?;
    let month = month
        .parse::<u32>()
        .with_context(|| format!("Invalid month number in: {input}"))?;

    if !(1..=12).contains(&month) {
        bail!("Month must be between 01 and 12: {input}");
    }
    if DateRange::month(year, month).is_none() {
        bail!("Month is outside the supported calendar: {input}");
    }

    Ok((year, month))
}

fn local_noon<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Utc>> {
    let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).context("Invalid noon time")?);

    tz.from_local_datetime(&noon)
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
        .with_context(|| format!("Failed to convert noon of {date} to local time"))
}
