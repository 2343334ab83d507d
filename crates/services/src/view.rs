use quiz_core::model::{Question, QuizResults, SessionState};
use quiz_core::stats::Stats;

/// Where the question set is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoadState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Outcome heading shown once an answer is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Sorry,
}

impl Feedback {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Feedback::Correct => "Correct!",
            Feedback::Sorry => "Sorry!",
        }
    }
}

/// What the advance action leads to from the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    NextQuestion,
    SeeResults,
}

impl NextAction {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            NextAction::NextQuestion => "Next Question",
            NextAction::SeeResults => "See Results",
        }
    }
}

/// Everything a presentation layer needs to draw the quiz.
///
/// Built fresh from the session state on every call; holds no state of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizView {
    pub load_state: LoadState,
    pub question: Option<Question>,
    /// 1-based position of `question`, 0 when there is none.
    pub question_number: usize,
    pub total: usize,
    pub stats: Stats,
    pub selected_option: Option<usize>,
    pub is_revealed: bool,
    pub is_complete: bool,
    pub feedback: Option<Feedback>,
    pub next_action: NextAction,
    pub difficulty_stars: u8,
    /// Final score once the session is complete.
    pub results: Option<QuizResults>,
}

impl QuizView {
    #[must_use]
    pub fn from_state(state: &SessionState, load_state: LoadState) -> Self {
        let question = state.current_question().cloned();
        let feedback = state.answered_correctly().map(|correct| {
            if correct {
                Feedback::Correct
            } else {
                Feedback::Sorry
            }
        });
        let next_action = if state.is_last_question() {
            NextAction::SeeResults
        } else {
            NextAction::NextQuestion
        };
        let results = state.is_complete().then(|| {
            QuizResults::new(
                u32::try_from(state.correct_count()).unwrap_or(u32::MAX),
                u32::try_from(state.total()).unwrap_or(u32::MAX),
            )
        });

        Self {
            load_state,
            question_number: if question.is_some() {
                state.current_index() + 1
            } else {
                0
            },
            difficulty_stars: question.as_ref().map_or(0, |q| q.difficulty().stars()),
            question,
            total: state.total(),
            stats: state.stats(),
            selected_option: state.selected_option(),
            is_revealed: state.is_revealed(),
            is_complete: state.is_complete(),
            feedback,
            next_action,
            results,
        }
    }
}
