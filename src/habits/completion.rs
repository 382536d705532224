use crate::dates::{date_key, local_date};
use crate::model::HabitCompletion;
use chrono::{NaiveDate, TimeZone};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Set of local calendar days on which a habit was completed.
///
/// Several records on the same day collapse into one completed day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionIndex {
    days: HashSet<NaiveDate>,
    record_count: usize,
}

impl CompletionIndex {
    pub fn build<'a, Tz, I>(completions: I, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        I: IntoIterator<Item = &'a HabitCompletion>,
    {
        completions
            .into_iter()
            .fold(Self::default(), |mut index, completion| {
                index.days.insert(local_date(&completion.completed_at, tz));
                index.record_count += 1;
                index
            })
    }

    pub fn from_days<I: IntoIterator<Item = NaiveDate>>(days: I) -> Self {
        let days = days.into_iter().collect::<Vec<_>>();
        Self {
            record_count: days.len(),
            days: days.into_iter().collect(),
        }
    }

    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.days.contains(&date)
    }

    pub fn all_completed_day_keys(&self) -> BTreeSet<String> {
        self.days.iter().copied().map(date_key).collect()
    }

    /// Completed days in chronological order.
    pub fn completed_days(&self) -> Vec<NaiveDate> {
        let mut days = self.days.iter().copied().collect::<Vec<_>>();
        days.sort_unstable();
        days
    }

    pub fn first_completed_day(&self) -> Option<NaiveDate> {
        self.days.iter().min().copied()
    }

    pub fn completed_day_count(&self) -> usize {
        self.days.len()
    }

    /// Number of raw records folded into the index, duplicates included.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Groups completions by habit id and indexes each group.
pub fn index_by_habit<Tz: TimeZone>(
    completions: &[HabitCompletion],
    tz: &Tz,
) -> HashMap<String, CompletionIndex> {
    completions
        .iter()
        .fold(HashMap::<&str, Vec<&HabitCompletion>>::new(), |mut acc, completion| {
            acc.entry(completion.habit_id.as_str())
                .or_default()
                .push(completion);
            acc
        })
        .into_iter()
        .map(|(habit_id, group)| (habit_id.to_string(), CompletionIndex::build(group, tz)))
        .collect()
}
