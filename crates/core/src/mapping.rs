//! Turning raw trivia records into session-ready [`Question`]s.

use rand::Rng;

use crate::model::{Difficulty, Question, QuestionId, RawQuestion};
use crate::shuffle::shuffle_with;
use crate::text::{decode, format_category};

/// Upper bound on the number of questions in one session.
pub const MAX_SESSION_QUESTIONS: usize = 20;

/// Map raw records to questions, shuffling each option list.
#[must_use]
pub fn map_questions(raw: &[RawQuestion]) -> Vec<Question> {
    map_questions_with(raw, &mut rand::rng())
}

/// Like [`map_questions`], drawing option order from `rng`.
///
/// The question at position `idx` gets id `idx + 1`.
#[must_use]
pub fn map_questions_with<R: Rng + ?Sized>(raw: &[RawQuestion], rng: &mut R) -> Vec<Question> {
    raw.iter()
        .enumerate()
        .map(|(idx, record)| map_question(idx, record, rng))
        .collect()
}

/// Build the question set for a new session: map every record, shuffle the
/// resulting order and keep at most `limit` (itself capped at
/// [`MAX_SESSION_QUESTIONS`]).
#[must_use]
pub fn prepare_session_questions<R: Rng + ?Sized>(
    raw: &[RawQuestion],
    limit: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mapped = map_questions_with(raw, rng);
    let mut ordered = shuffle_with(&mapped, rng);
    ordered.truncate(limit.min(MAX_SESSION_QUESTIONS));
    ordered
}

fn map_question<R: Rng + ?Sized>(idx: usize, record: &RawQuestion, rng: &mut R) -> Question {
    let correct = decode(record.correct_answer.as_deref().unwrap_or_default());
    let mut options: Vec<String> = record
        .incorrect_answers
        .iter()
        .flatten()
        .map(|answer| decode(answer))
        .collect();
    options.push(correct.clone());

    let options = shuffle_with(&options, rng);
    // Duplicate option texts resolve to the first match.
    let correct_index = options
        .iter()
        .position(|option| *option == correct)
        .unwrap_or(options.len() - 1);

    Question::new(
        QuestionId::from_position(idx),
        decode(record.question.as_deref().unwrap_or_default()),
        options,
        correct_index,
        format_category(record.category.as_deref()),
        Difficulty::from_raw(record.difficulty.as_deref()),
    )
}
