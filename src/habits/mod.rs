pub mod completion;
pub mod rate;
pub mod schedule;
pub mod streak;

use crate::habits::completion::{CompletionIndex, index_by_habit};
use crate::habits::schedule::Recurrence;
use crate::model::{Habit, HabitCompletion, HabitKind};
use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

/// Everything a habit card shows for one reference day.
#[derive(Debug, Clone, Serialize)]
pub struct HabitProgress {
    pub habit_id: String,
    pub title: String,
    pub kind: HabitKind,
    /// True only for an empty recurrence. A list of unknown tokens is never due.
    pub every_day: bool,
    pub recurrence: Vec<&'static str>,
    pub due_today: bool,
    pub completed_today: bool,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub weekly_rate: u8,
    pub due_days_this_week: u32,
    pub completed_days: usize,
}

pub fn summarize_habit(habit: &Habit, index: &CompletionIndex, today: NaiveDate) -> HabitProgress {
    let recurrence = Recurrence::parse(&habit.recurrence);

    HabitProgress {
        habit_id: habit.id.clone(),
        title: habit.title.clone(),
        kind: habit.kind,
        every_day: recurrence == Recurrence::EveryDay,
        recurrence: recurrence.tokens(),
        due_today: recurrence.is_due_on(today),
        completed_today: index.is_completed_on(today),
        current_streak: streak::current_streak(index, today),
        longest_streak: streak::longest_streak(index),
        weekly_rate: rate::weekly_rate(index, today),
        due_days_this_week: rate::due_days_in_window(habit, today, rate::WEEKLY_WINDOW_DAYS),
        completed_days: index.completed_day_count(),
    }
}

/// Progress for every habit, in the order the habits were given.
pub fn summarize_habits<Tz: TimeZone>(
    habits: &[Habit],
    completions: &[HabitCompletion],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<HabitProgress> {
    let indexes = index_by_habit(completions, tz);
    let empty = CompletionIndex::default();

    habits
        .iter()
        .map(|habit| summarize_habit(habit, indexes.get(&habit.id).unwrap_or(&empty), today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::summarize_habits;
    use crate::dates::parse_day_key;
    use crate::model::{Habit, HabitCompletion, HabitKind};
    use chrono::{TimeZone, Utc};

    fn habit(id: &str, recurrence: &[&str]) -> Habit {
        Habit {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: format!("Habit {id}"),
            recurrence: recurrence.iter().map(|token| token.to_string()).collect(),
            kind: HabitKind::Builder,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        }
    }

    fn done(habit_id: &str, day: u32) -> HabitCompletion {
        HabitCompletion {
            id: format!("{habit_id}-{day}"),
            habit_id: habit_id.to_string(),
            completed_at: Utc.with_ymd_and_hms(2024, 6, day, 7, 30, 0).unwrap(),
        }
    }

    #[test]
    fn meditate_card_reports_streak_and_rate() {
        let habits = [habit("meditate", &[])];
        let completions = (1..=5).map(|day| done("meditate", day)).collect::<Vec<_>>();
        let today = parse_day_key("2024-06-05").unwrap();

        let cards = summarize_habits(&habits, &completions, today, &Utc);
        let card = &cards[0];

        assert!(card.due_today);
        assert!(card.completed_today);
        assert_eq!(card.current_streak, 5);
        assert_eq!(card.longest_streak, 5);
        assert_eq!(card.weekly_rate, 71);
        assert_eq!(card.due_days_this_week, 7);
        assert_eq!(card.completed_days, 5);
    }

    #[test]
    fn habit_without_completions_gets_zeroed_card() {
        let habits = [habit("read", &["Mon", "Tue"]), habit("run", &[])];
        let completions = vec![done("run", 5)];
        let today = parse_day_key("2024-06-05").unwrap();

        let cards = summarize_habits(&habits, &completions, today, &Utc);

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].habit_id, "read");
        assert!(!cards[0].due_today);
        assert_eq!(cards[0].current_streak, 0);
        assert_eq!(cards[0].weekly_rate, 0);
        assert_eq!(cards[0].recurrence, vec!["Mon", "Tue"]);
        assert_eq!(cards[1].current_streak, 1);
    }

    #[test]
    fn unknown_tokens_are_not_reported_as_every_day() {
        let habits = [habit("daily", &[]), habit("typo", &["Mnday", "someday"])];
        let today = parse_day_key("2024-06-05").unwrap();

        let cards = summarize_habits(&habits, &[], today, &Utc);

        assert!(cards[0].every_day);
        assert!(cards[0].recurrence.is_empty());
        assert!(!cards[1].every_day);
        assert!(cards[1].recurrence.is_empty());
        assert!(!cards[1].due_today);
        assert_eq!(cards[1].due_days_this_week, 0);
    }
}
