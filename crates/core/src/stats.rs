//! Display statistics derived from a session's progress.
//!
//! Everything here is a pure function of the session fields; nothing is
//! cached between calls.

use crate::model::Question;

/// Percentages and counts shown alongside the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub answered_count: usize,
    pub wrong_count: usize,
    pub remaining_questions: usize,
    pub max_possible_score: usize,
    pub score_percent: u8,
    pub wrong_percent: u8,
    pub max_possible_percent: u8,
    pub remaining_from_max_percent: u8,
    pub top_progress_percent: u8,
}

/// `round(100 * n / total)` clamped to `0..=100`, with halves rounded up.
///
/// Returns 0 when `total` is 0.
#[must_use]
pub fn percent_of(n: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let n = n as u128;
    let total = total as u128;
    let rounded = (200 * n + total) / (2 * total);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}

/// Derive [`Stats`] for a session positioned at `current_index`.
#[must_use]
pub fn compute_stats(
    questions: &[Question],
    current_index: usize,
    correct_count: usize,
    is_revealed: bool,
) -> Stats {
    let total = questions.len();
    let answered_count = if is_revealed {
        current_index + 1
    } else {
        current_index
    };
    let wrong_count = answered_count.saturating_sub(correct_count);
    let remaining_questions = total.saturating_sub(current_index);
    let max_possible_score = (correct_count + remaining_questions).min(total);

    let score_percent = percent_of(correct_count, total);
    // Two halves rounding up together could otherwise reach 101.
    let wrong_percent = percent_of(wrong_count, total).min(100 - score_percent);
    let max_possible_percent = percent_of(max_possible_score, total);

    Stats {
        total,
        answered_count,
        wrong_count,
        remaining_questions,
        max_possible_score,
        score_percent,
        wrong_percent,
        max_possible_percent,
        remaining_from_max_percent: max_possible_percent.saturating_sub(score_percent),
        top_progress_percent: percent_of(current_index + 1, total),
    }
}
