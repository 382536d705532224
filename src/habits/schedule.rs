use crate::dates::{DateRange, WEEKDAY_NAMES};
use crate::model::Habit;
use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

/// Which weekdays a habit is due on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    EveryDay,
    /// Bit `n` set means due on the weekday `n` days from Monday.
    Weekdays(u8),
}

impl Recurrence {
    /// Parses stored weekday tokens. An empty list means every day;
    /// unrecognized tokens are skipped.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Self {
        if tokens.is_empty() {
            return Self::EveryDay;
        }

        let mask = tokens.iter().fold(0_u8, |mask, token| {
            match parse_weekday_token(token.as_ref()) {
                Some(weekday) => mask | weekday_bit(weekday),
                None => {
                    debug!(token = token.as_ref(), "ignoring unrecognized recurrence token");
                    mask
                }
            }
        });

        Self::Weekdays(mask)
    }

    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        match self {
            Self::EveryDay => true,
            Self::Weekdays(mask) => *mask & weekday_bit(date.weekday()) != 0,
        }
    }

    /// Canonical tokens in Monday-first order. Empty for `EveryDay`.
    pub fn tokens(&self) -> Vec<&'static str> {
        match self {
            Self::EveryDay => Vec::new(),
            Self::Weekdays(mask) => WEEKDAY_NAMES
                .iter()
                .enumerate()
                .filter(|(index, _)| *mask & (1_u8 << *index) != 0)
                .map(|(_, name)| *name)
                .collect(),
        }
    }
}

pub fn parse_weekday_token(raw: &str) -> Option<Weekday> {
    match raw.trim().to_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn is_due_on(habit: &Habit, date: NaiveDate) -> bool {
    Recurrence::parse(&habit.recurrence).is_due_on(date)
}

pub fn due_dates(habit: &Habit, range: DateRange) -> Vec<NaiveDate> {
    let recurrence = Recurrence::parse(&habit.recurrence);
    range.days().filter(|day| recurrence.is_due_on(*day)).collect()
}

fn weekday_bit(weekday: Weekday) -> u8 {
    1 << weekday.num_days_from_monday()
}
