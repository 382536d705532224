use crate::calendar::Snapshot;
use crate::dates::{date_key, local_date, shift_days};
use crate::habits::{HabitProgress, summarize_habits};
use crate::model::{Reminder, ReminderStatus, TodoStatus};
use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub date: String,
    pub habits: Vec<HabitProgress>,
    pub habits_due_today: usize,
    pub habits_completed_today: usize,
    pub best_current_streak: u32,
    pub average_weekly_rate: u8,
    pub pending_todos: usize,
    pub overdue_todos: usize,
    pub todos_due_today: usize,
    pub completed_todos: usize,
    pub reminders_today: Vec<Reminder>,
    pub upcoming_reminders: Vec<Reminder>,
}

/// Home-screen summary for `today`.
///
/// `upcoming_days` bounds the pending reminders listed after today.
pub fn build_dashboard<Tz: TimeZone>(
    snapshot: &Snapshot,
    today: NaiveDate,
    upcoming_days: u32,
    tz: &Tz,
) -> Dashboard {
    let habits = summarize_habits(&snapshot.habits, &snapshot.completions, today, tz);

    let habits_due_today = habits.iter().filter(|habit| habit.due_today).count();
    let habits_completed_today = habits
        .iter()
        .filter(|habit| habit.due_today && habit.completed_today)
        .count();
    let best_current_streak = habits
        .iter()
        .map(|habit| habit.current_streak)
        .max()
        .unwrap_or_default();
    let average_weekly_rate = if habits.is_empty() {
        0
    } else {
        let total = habits
            .iter()
            .map(|habit| f64::from(habit.weekly_rate))
            .sum::<f64>();
        (total / habits.len() as f64).round() as u8
    };

    let pending_todos = snapshot
        .todos
        .iter()
        .filter(|todo| todo.status == TodoStatus::Pending)
        .count();
    let overdue_todos = snapshot
        .todos
        .iter()
        .filter(|todo| todo.is_overdue(today, tz))
        .count();
    let todos_due_today = snapshot
        .todos
        .iter()
        .filter(|todo| {
            todo.status == TodoStatus::Pending
                && todo
                    .due_at
                    .as_ref()
                    .is_some_and(|due| local_date(due, tz) == today)
        })
        .count();
    let completed_todos = snapshot.todos.iter().filter(|todo| todo.is_completed()).count();

    let horizon = shift_days(today, i64::from(upcoming_days));
    let pending_reminders = sorted_pending_reminders(&snapshot.reminders);
    let reminders_today = pending_reminders
        .iter()
        .filter(|reminder| local_date(&reminder.remind_at, tz) == today)
        .cloned()
        .collect::<Vec<_>>();
    let upcoming_reminders = pending_reminders
        .into_iter()
        .filter(|reminder| {
            let day = local_date(&reminder.remind_at, tz);
            day > today && day <= horizon
        })
        .collect::<Vec<_>>();

    Dashboard {
        date: date_key(today),
        habits,
        habits_due_today,
        habits_completed_today,
        best_current_streak,
        average_weekly_rate,
        pending_todos,
        overdue_todos,
        todos_due_today,
        completed_todos,
        reminders_today,
        upcoming_reminders,
    }
}

fn sorted_pending_reminders(reminders: &[Reminder]) -> Vec<Reminder> {
    let mut pending = reminders
        .iter()
        .filter(|reminder| reminder.status == ReminderStatus::Pending)
        .cloned()
        .collect::<Vec<_>>();
    pending.sort_by(|left, right| {
        left.remind_at
            .cmp(&right.remind_at)
            .then_with(|| left.title.cmp(&right.title))
    });
    pending
}
