use crate::dates::DateRange;
use crate::habits::completion::CompletionIndex;
use crate::habits::schedule::Recurrence;
use crate::model::Habit;
use chrono::NaiveDate;

pub const WEEKLY_WINDOW_DAYS: u32 = 7;

/// Percentage of the trailing seven days (today included) that were completed.
///
/// The denominator is always seven, whatever the habit's schedule, so a
/// twice-a-week habit tops out at 29%. `due_days_in_window` gives callers
/// the schedule-aware count to show next to it.
pub fn weekly_rate(index: &CompletionIndex, today: NaiveDate) -> u8 {
    completion_rate(index, today, WEEKLY_WINDOW_DAYS)
}

/// Completed days over the trailing `window_days`, rounded to a whole percent.
pub fn completion_rate(index: &CompletionIndex, today: NaiveDate, window_days: u32) -> u8 {
    if window_days == 0 {
        return 0;
    }

    let completed = DateRange::trailing(today, window_days)
        .days()
        .filter(|day| index.is_completed_on(*day))
        .count();

    let ratio = completed as f64 / f64::from(window_days) * 100.0;
    ratio.round().clamp(0.0, 100.0) as u8
}

pub fn due_days_in_window(habit: &Habit, today: NaiveDate, window_days: u32) -> u32 {
    if window_days == 0 {
        return 0;
    }

    let recurrence = Recurrence::parse(&habit.recurrence);
    DateRange::trailing(today, window_days)
        .days()
        .filter(|day| recurrence.is_due_on(*day))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::{completion_rate, due_days_in_window, weekly_rate};
    use crate::dates::parse_day_key;
    use crate::habits::completion::CompletionIndex;
    use crate::model::{Habit, HabitKind};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn today() -> NaiveDate {
        parse_day_key("2024-06-05").unwrap()
    }

    fn last_n_days(n: i64) -> CompletionIndex {
        CompletionIndex::from_days((0..n).map(|offset| today() - Duration::days(offset)))
    }

    #[test]
    fn rate_stays_within_bounds_for_every_count() {
        let expected = [0, 14, 29, 43, 57, 71, 86, 100];

        for (completed, percent) in expected.into_iter().enumerate() {
            let rate = weekly_rate(&last_n_days(completed as i64), today());
            assert_eq!(rate, percent, "{completed} completed days");
            assert!(rate <= 100);
        }
    }

    #[test]
    fn days_outside_window_do_not_count() {
        let old = CompletionIndex::from_days([
            today() - Duration::days(7),
            today() - Duration::days(30),
        ]);

        assert_eq!(weekly_rate(&old, today()), 0);
    }

    #[test]
    fn future_completions_are_ignored() {
        let future = CompletionIndex::from_days([today() + Duration::days(1)]);
        assert_eq!(weekly_rate(&future, today()), 0);
    }

    #[test]
    fn zero_window_is_zero() {
        assert_eq!(completion_rate(&last_n_days(3), today(), 0), 0);
        assert_eq!(completion_rate(&last_n_days(30), today(), 30), 100);
    }

    #[test]
    fn due_days_follow_recurrence() {
        let habit = Habit {
            id: "h1".to_string(),
            user_id: "u1".to_string(),
            title: "Gym".to_string(),
            recurrence: vec!["Mon".to_string(), "Thu".to_string()],
            kind: HabitKind::Builder,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };

        assert_eq!(due_days_in_window(&habit, today(), 7), 2);
        assert_eq!(due_days_in_window(&habit, today(), 0), 0);
    }
}
