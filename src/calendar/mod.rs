//! Per-day aggregation of habits, todos and reminders.
//!
//! Every function here is a pure computation over a [`Snapshot`]; callers
//! rebuild the summaries after each fetch instead of caching them.

pub mod dashboard;

use crate::dates::{DateRange, date_key, local_date, weekday_name};
use crate::habits::completion::{CompletionIndex, index_by_habit};
use crate::habits::schedule::Recurrence;
use crate::model::{Habit, HabitCompletion, HabitKind, Reminder, Todo};
use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, TimeZone, Weekday};
use serde::Serialize;
use std::collections::HashMap;

/// One user's already-fetched collections.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub habits: Vec<Habit>,
    pub completions: Vec<HabitCompletion>,
    pub todos: Vec<Todo>,
    pub reminders: Vec<Reminder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayBucket<T> {
    pub completed: usize,
    pub total: usize,
    pub items: Vec<T>,
}

impl<T> DayBucket<T> {
    fn collect<I, F>(items: I, is_completed: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> bool,
    {
        let items = items.into_iter().collect::<Vec<_>>();
        Self {
            completed: items.iter().filter(|item| is_completed(*item)).count(),
            total: items.len(),
            items,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitOccurrence {
    pub habit_id: String,
    pub title: String,
    pub kind: HabitKind,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day_key: String,
    pub weekday: &'static str,
    pub is_current_period: bool,
    pub is_today: bool,
    pub has_items: bool,
    pub habits: DayBucket<HabitOccurrence>,
    pub todos: DayBucket<Todo>,
    pub reminders: DayBucket<Reminder>,
}

/// Summaries for every day of `range`, in chronological order.
pub fn build_day_summaries<Tz: TimeZone>(
    snapshot: &Snapshot,
    range: DateRange,
    today: NaiveDate,
    tz: &Tz,
) -> Vec<CalendarDay> {
    build_days(snapshot, range, range, today, tz)
}

/// Whole weeks covering the month. Leading and trailing days from the
/// neighbouring months are flagged `is_current_period = false`.
pub fn build_month_grid<Tz: TimeZone>(
    snapshot: &Snapshot,
    year: i32,
    month: u32,
    week_start: Weekday,
    today: NaiveDate,
    tz: &Tz,
) -> Result<Vec<CalendarDay>> {
    let period = DateRange::month(year, month)
        .with_context(|| format!("Invalid month: {year}-{month:02}"))?;

    let lead = days_from_week_start(period.start().weekday(), week_start);
    let trail = 6 - days_from_week_start(period.end().weekday(), week_start);
    let grid_start = period
        .start()
        .checked_sub_signed(Duration::days(lead))
        .with_context(|| format!("Month grid starts before the calendar: {year}-{month:02}"))?;
    let grid_end = period
        .end()
        .checked_add_signed(Duration::days(trail))
        .with_context(|| format!("Month grid ends after the calendar: {year}-{month:02}"))?;
    let grid = DateRange::new(grid_start, grid_end)?;

    Ok(build_days(snapshot, grid, period, today, tz))
}

fn build_days<Tz: TimeZone>(
    snapshot: &Snapshot,
    range: DateRange,
    period: DateRange,
    today: NaiveDate,
    tz: &Tz,
) -> Vec<CalendarDay> {
    let indexes = index_by_habit(&snapshot.completions, tz);
    let empty = CompletionIndex::default();
    let schedules = snapshot
        .habits
        .iter()
        .map(|habit| {
            (
                habit,
                Recurrence::parse(&habit.recurrence),
                indexes.get(&habit.id).unwrap_or(&empty),
            )
        })
        .collect::<Vec<_>>();

    let todos_by_day = group_by_day(&snapshot.todos, |todo| todo.anchor_date(tz));
    let reminders_by_day = group_by_day(&snapshot.reminders, |reminder| {
        local_date(&reminder.remind_at, tz)
    });

    range
        .days()
        .map(|date| {
            let habits = DayBucket::collect(
                schedules
                    .iter()
                    .filter(|(_, recurrence, _)| recurrence.is_due_on(date))
                    .map(|(habit, _, index)| HabitOccurrence {
                        habit_id: habit.id.clone(),
                        title: habit.title.clone(),
                        kind: habit.kind,
                        completed: index.is_completed_on(date),
                    }),
                |occurrence| occurrence.completed,
            );
            let todos = DayBucket::collect(
                todos_by_day
                    .get(&date)
                    .into_iter()
                    .flatten()
                    .map(|todo| (*todo).clone()),
                Todo::is_completed,
            );
            let reminders = DayBucket::collect(
                reminders_by_day
                    .get(&date)
                    .into_iter()
                    .flatten()
                    .map(|reminder| (*reminder).clone()),
                Reminder::is_completed,
            );

            CalendarDay {
                date,
                day_key: date_key(date),
                weekday: weekday_name(date),
                is_current_period: period.contains(date),
                is_today: date == today,
                has_items: habits.total + todos.total + reminders.total > 0,
                habits,
                todos,
                reminders,
            }
        })
        .collect()
}

fn group_by_day<T, F>(items: &[T], day_of: F) -> HashMap<NaiveDate, Vec<&T>>
where
    F: Fn(&T) -> NaiveDate,
{
    items.iter().fold(HashMap::new(), |mut acc, item| {
        acc.entry(day_of(item)).or_insert_with(Vec::new).push(item);
        acc
    })
}

fn days_from_week_start(day: Weekday, week_start: Weekday) -> i64 {
    i64::from((day.num_days_from_monday() + 7 - week_start.num_days_from_monday()) % 7)
}
