use crate::habits::completion::CompletionIndex;
use chrono::NaiveDate;

/// Consecutive completed days ending at `today`.
///
/// Returns 0 when `today` itself is not completed, even if yesterday was.
/// The walk visits each completed day at most once, so it always terminates.
pub fn current_streak(index: &CompletionIndex, today: NaiveDate) -> u32 {
    run_ending_at(index, today)
}

/// Longest run of consecutive completed days anywhere in the history.
pub fn longest_streak(index: &CompletionIndex) -> u32 {
    let (longest, _) = index.completed_days().windows(2).fold(
        (u32::from(!index.is_empty()), 1_u32),
        |(longest, current), pair| {
            let current = if pair[0].succ_opt() == Some(pair[1]) {
                current + 1
            } else {
                1
            };
            (longest.max(current), current)
        },
    );

    longest
}

fn run_ending_at(index: &CompletionIndex, day: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut cursor = Some(day);

    while let Some(completed_day) = cursor.filter(|candidate| index.is_completed_on(*candidate)) {
        streak += 1;
        cursor = completed_day.pred_opt();
    }

    streak
}
