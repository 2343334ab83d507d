use serde::{Deserialize, Serialize};

use crate::model::Question;
use crate::stats::{Stats, compute_stats};

//
// ─── POLICY ───────────────────────────────────────────────────────────────────
//

/// How selecting an option relates to revealing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvancePolicy {
    /// Selecting an option scores and reveals it at once; `advance` moves on.
    #[default]
    RevealOnSelect,
    /// Selecting only records a (changeable) choice; the first `advance`
    /// scores and reveals it, the second moves on.
    ConfirmThenAdvance,
}

//
// ─── SNAPSHOT ─────────────────────────────────────────────────────────────────
//

/// The part of a session persisted under `quiz_state` to survive reloads.
///
/// Every field is optional on read; absent fields leave the live state as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSnapshot {
    #[serde(rename = "currentQuestionIndex")]
    pub current_index: Option<usize>,
    #[serde(rename = "correctAnswersCount")]
    pub correct_count: Option<usize>,
    #[serde(rename = "selectedOptionIndex")]
    pub selected_option: Option<usize>,
    #[serde(rename = "isAnswerRevealed")]
    pub is_revealed: Option<bool>,
}

//
// ─── SESSION STATE ────────────────────────────────────────────────────────────
//

/// One run through an ordered set of questions.
///
/// Transitions consume the state and return the next one. None of them can
/// fail: inputs that make no sense for the current state leave it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    policy: AdvancePolicy,
    questions: Vec<Question>,
    current_index: usize,
    selected_option: Option<usize>,
    correct_count: usize,
    is_revealed: bool,
    is_complete: bool,
}

impl SessionState {
    #[must_use]
    pub fn new(policy: AdvancePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn policy(&self) -> AdvancePolicy {
        self.policy
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.is_revealed
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    /// True when the current question is the last one of the set.
    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    /// Whether the revealed selection on the current question was correct.
    #[must_use]
    pub fn answered_correctly(&self) -> Option<bool> {
        if !self.is_revealed {
            return None;
        }
        let question = self.current_question()?;
        Some(self.selected_option.is_some_and(|i| question.is_correct(i)))
    }

    #[must_use]
    pub fn stats(&self) -> Stats {
        compute_stats(
            &self.questions,
            self.current_index,
            self.correct_count,
            self.is_revealed,
        )
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_index: Some(self.current_index),
            correct_count: Some(self.correct_count),
            selected_option: self.selected_option,
            is_revealed: Some(self.is_revealed),
        }
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────
    //

    /// Replace the question set. Position and counts are left alone so a
    /// restored set can be followed by [`Self::restore_snapshot`].
    #[must_use]
    pub fn load_questions(mut self, questions: Vec<Question>) -> Self {
        self.questions = questions;
        self
    }

    /// Choose option `index` for the current question.
    ///
    /// Ignored once the answer is revealed, after completion, when no
    /// question is loaded, or when `index` is not an option of the current
    /// question.
    #[must_use]
    pub fn select_option(mut self, index: usize) -> Self {
        if self.is_revealed || self.is_complete {
            return self;
        }
        let Some(question) = self.current_question() else {
            return self;
        };
        if index >= question.options().len() {
            return self;
        }

        self.selected_option = Some(index);
        match self.policy {
            AdvancePolicy::RevealOnSelect => self.reveal(),
            AdvancePolicy::ConfirmThenAdvance => self,
        }
    }

    /// Move past the current question, completing the session after the last.
    ///
    /// With no questions loaded the session completes immediately.
    #[must_use]
    pub fn advance(mut self) -> Self {
        if self.is_complete {
            return self;
        }
        if self.questions.is_empty() {
            self.is_complete = true;
            return self;
        }
        if !self.is_revealed {
            return match (self.policy, self.selected_option) {
                (AdvancePolicy::ConfirmThenAdvance, Some(_)) => self.reveal(),
                _ => self,
            };
        }

        let next = self.current_index + 1;
        if next >= self.questions.len() {
            self.is_complete = true;
        } else {
            self.current_index = next;
            self.selected_option = None;
            self.is_revealed = false;
        }
        self
    }

    /// Return to an empty session, optionally keeping the loaded questions.
    #[must_use]
    pub fn reset(self, keep_questions: bool) -> Self {
        let questions = if keep_questions {
            self.questions
        } else {
            Vec::new()
        };
        Self {
            policy: self.policy,
            questions,
            ..Self::default()
        }
    }

    /// Overlay the fields present in `snapshot` onto this state.
    ///
    /// The question set is never touched. A snapshot that would put the
    /// session in an impossible position for the loaded questions (index past
    /// the end, more correct answers than answered questions, an option that
    /// does not exist) is dropped as a whole.
    #[must_use]
    pub fn restore_snapshot(self, snapshot: &SessionSnapshot) -> Self {
        let mut merged = self.clone();
        if let Some(index) = snapshot.current_index {
            merged.current_index = index;
        }
        if let Some(count) = snapshot.correct_count {
            merged.correct_count = count;
        }
        if let Some(option) = snapshot.selected_option {
            merged.selected_option = Some(option);
        }
        if let Some(revealed) = snapshot.is_revealed {
            merged.is_revealed = revealed;
        }

        if merged.is_consistent() {
            merged
        } else {
            log::warn!("discarding session snapshot inconsistent with loaded questions: {snapshot:?}");
            self
        }
    }

    fn reveal(mut self) -> Self {
        let correct = match (self.current_question(), self.selected_option) {
            (Some(question), Some(option)) => question.is_correct(option),
            _ => false,
        };
        if correct {
            self.correct_count += 1;
        }
        self.is_revealed = true;
        self
    }

    fn is_consistent(&self) -> bool {
        if self.questions.is_empty() {
            return self.current_index == 0 && self.correct_count == 0;
        }
        let Some(question) = self.current_question() else {
            return false;
        };
        let option_ok = self
            .selected_option
            .is_none_or(|option| option < question.options().len());
        let answered = if self.is_revealed {
            self.current_index + 1
        } else {
            self.current_index
        };
        option_ok && self.correct_count <= answered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, QuestionId};

    fn question(id: usize, correct: usize) -> Question {
        Question::new(
            QuestionId::from_position(id),
            format!("Question {id}"),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct,
            "General",
            Difficulty::Medium,
        )
    }

    fn loaded(n: usize) -> SessionState {
        SessionState::default().load_questions((0..n).map(|i| question(i, i % 4)).collect())
    }

    #[test]
    fn correct_selection_scores_and_reveals() {
        let state = loaded(3).select_option(0);
        assert_eq!(state.selected_option(), Some(0));
        assert_eq!(state.correct_count(), 1);
        assert!(state.is_revealed());
        assert_eq!(state.answered_correctly(), Some(true));
    }

    #[test]
    fn wrong_selection_then_advance() {
        let state = loaded(3).select_option(2);
        assert!(state.is_revealed());
        assert_eq!(state.correct_count(), 0);
        assert_eq!(state.answered_correctly(), Some(false));

        let state = state.advance();
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.selected_option(), None);
        assert!(!state.is_revealed());
        assert!(!state.is_complete());
    }

    #[test]
    fn reselection_after_reveal_is_ignored() {
        let first = loaded(2).select_option(1);
        let second = first.clone().select_option(0).select_option(0);
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_option_is_ignored() {
        let state = loaded(2).select_option(9);
        assert_eq!(state.selected_option(), None);
        assert!(!state.is_revealed());
    }

    #[test]
    fn advance_requires_reveal() {
        let state = loaded(2).advance();
        assert_eq!(state.current_index(), 0);
        assert!(!state.is_complete());
    }

    #[test]
    fn completion_keeps_index_in_range() {
        let state = loaded(2).select_option(0).advance().select_option(1).advance();
        assert!(state.is_complete());
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.correct_count(), 2);

        let after = state.clone().select_option(0).advance();
        assert_eq!(after, state);
    }

    #[test]
    fn empty_session_completes_on_advance() {
        let state = SessionState::default().advance();
        assert!(state.is_complete());
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn select_on_empty_session_is_noop() {
        let state = SessionState::default().select_option(0);
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn correct_count_never_exceeds_position() {
        let mut state = loaded(6);
        for _ in 0..6 {
            let correct = state.current_question().unwrap().correct_index();
            state = state.select_option(correct);
            assert!(state.correct_count() <= state.current_index() + 1);
            let before = state.current_index();
            state = state.advance();
            assert!(state.current_index() >= before);
        }
        assert!(state.is_complete());
        assert_eq!(state.correct_count(), 6);
    }

    #[test]
    fn confirm_policy_needs_two_advances() {
        let state = SessionState::new(AdvancePolicy::ConfirmThenAdvance)
            .load_questions(vec![question(0, 2), question(1, 0)]);

        let state = state.select_option(1).select_option(2);
        assert_eq!(state.selected_option(), Some(2));
        assert!(!state.is_revealed());
        assert_eq!(state.correct_count(), 0);

        let state = state.advance();
        assert!(state.is_revealed());
        assert_eq!(state.correct_count(), 1);
        assert_eq!(state.current_index(), 0);

        let state = state.advance();
        assert_eq!(state.current_index(), 1);
        assert!(!state.is_revealed());
    }

    #[test]
    fn confirm_policy_ignores_advance_without_selection() {
        let state = SessionState::new(AdvancePolicy::ConfirmThenAdvance)
            .load_questions(vec![question(0, 0)])
            .advance();
        assert!(!state.is_revealed());
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn reset_can_keep_questions() {
        let played = loaded(3).select_option(0).advance();

        let kept = played.clone().reset(true);
        assert_eq!(kept.total(), 3);
        assert_eq!(kept.current_index(), 0);
        assert_eq!(kept.correct_count(), 0);
        assert!(!kept.is_complete());

        let cleared = played.reset(false);
        assert_eq!(cleared.total(), 0);
    }

    #[test]
    fn reset_clears_completion_and_keeps_policy() {
        let done = SessionState::new(AdvancePolicy::ConfirmThenAdvance).advance();
        assert!(done.is_complete());
        let fresh = done.reset(false);
        assert!(!fresh.is_complete());
        assert_eq!(fresh.policy(), AdvancePolicy::ConfirmThenAdvance);
    }

    #[test]
    fn snapshot_round_trip_into_fresh_state() {
        let played = loaded(4).select_option(0).advance().select_option(3);
        let snapshot = played.snapshot();

        let restored = loaded(4).restore_snapshot(&snapshot);
        assert_eq!(restored.current_index(), played.current_index());
        assert_eq!(restored.correct_count(), played.correct_count());
        assert_eq!(restored.selected_option(), played.selected_option());
        assert_eq!(restored.is_revealed(), played.is_revealed());
    }

    #[test]
    fn partial_snapshot_only_touches_present_fields() {
        let base = loaded(4).select_option(0).advance();
        let snapshot = SessionSnapshot {
            current_index: Some(2),
            ..SessionSnapshot::default()
        };
        let restored = base.clone().restore_snapshot(&snapshot);
        assert_eq!(restored.current_index(), 2);
        assert_eq!(restored.correct_count(), base.correct_count());
        assert_eq!(restored.questions(), base.questions());
    }

    #[test]
    fn inconsistent_snapshot_is_dropped() {
        let base = loaded(2);
        let past_end = SessionSnapshot {
            current_index: Some(5),
            ..SessionSnapshot::default()
        };
        assert_eq!(base.clone().restore_snapshot(&past_end), base);

        let too_many_correct = SessionSnapshot {
            current_index: Some(0),
            correct_count: Some(3),
            is_revealed: Some(true),
            ..SessionSnapshot::default()
        };
        assert_eq!(base.clone().restore_snapshot(&too_many_correct), base);
    }

    #[test]
    fn snapshot_uses_stored_field_names() {
        let json = serde_json::to_value(loaded(1).select_option(0).snapshot()).unwrap();
        assert_eq!(json["currentQuestionIndex"], 0);
        assert_eq!(json["correctAnswersCount"], 1);
        assert_eq!(json["selectedOptionIndex"], 0);
        assert_eq!(json["isAnswerRevealed"], true);

        let partial: SessionSnapshot =
            serde_json::from_str(r#"{"currentQuestionIndex":3,"selectedOptionIndex":null}"#)
                .unwrap();
        assert_eq!(partial.current_index, Some(3));
        assert_eq!(partial.selected_option, None);
        assert_eq!(partial.is_revealed, None);
    }
}
