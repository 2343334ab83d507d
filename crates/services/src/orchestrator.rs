use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use quiz_core::model::{QuizResults, SessionState};

use crate::config::{QuizConfig, ResetPolicy};
use crate::persistence::PersistenceGateway;
use crate::question_service::QuestionService;
use crate::view::{LoadState, QuizView};

/// Shared switch that stops an in-flight startup from touching the session.
///
/// Cloned handles observe the same flag; once torn down it stays down.
#[derive(Debug, Clone, Default)]
pub struct TeardownHandle {
    torn_down: Arc<AtomicBool>,
}

impl TeardownHandle {
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }
}

/// Drives one quiz session: startup, user actions and persistence.
///
/// Questions come from an injected [`QuestionService`]; durability from an
/// injected [`PersistenceGateway`]. Neither is global.
pub struct QuizOrchestrator {
    questions: Arc<QuestionService>,
    persistence: PersistenceGateway,
    reset_policy: ResetPolicy,
    state: SessionState,
    load_state: LoadState,
    teardown: TeardownHandle,
    // Reset flag written by this instance and not yet superseded by new progress.
    reset_pending: bool,
}

impl QuizOrchestrator {
    #[must_use]
    pub fn new(
        config: &QuizConfig,
        questions: Arc<QuestionService>,
        persistence: PersistenceGateway,
    ) -> Self {
        Self {
            questions,
            persistence,
            reset_policy: config.reset_policy,
            state: SessionState::new(config.advance_policy),
            load_state: LoadState::Idle,
            teardown: TeardownHandle::default(),
            reset_pending: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    #[must_use]
    pub fn teardown_handle(&self) -> TeardownHandle {
        self.teardown.clone()
    }

    #[must_use]
    pub fn view(&self) -> QuizView {
        QuizView::from_state(&self.state, self.load_state.clone())
    }

    /// Bring the session up: honour a pending reset, restore or fetch the
    /// question set, then restore the saved position unless a reset was
    /// pending.
    ///
    /// Once the teardown handle fires, no later step touches state or
    /// storage.
    pub async fn start(&mut self) {
        let reset = self.persistence.should_reset().await;
        if self.teardown.is_torn_down() {
            return;
        }
        if reset {
            log::info!("reset flag set; discarding saved progress");
            self.persistence
                .clear_all(self.reset_policy.keeps_questions())
                .await;
            self.persistence.set_reset_flag(false).await;
            self.reset_pending = false;
        }

        let stored = self.persistence.get_questions().await;
        if self.teardown.is_torn_down() {
            return;
        }
        if let Some(questions) = stored {
            log::info!("restored {} saved questions", questions.len());
            self.state = std::mem::take(&mut self.state).load_questions(questions);
        } else {
            self.load_state = LoadState::Loading;
            let fetched = self.questions.fetch_questions().await;
            if self.teardown.is_torn_down() {
                log::debug!("session torn down during fetch; dropping result");
                return;
            }
            match fetched {
                Ok(questions) => {
                    self.persistence.set_questions(&questions).await;
                    if self.teardown.is_torn_down() {
                        return;
                    }
                    self.state = std::mem::take(&mut self.state).load_questions(questions);
                }
                Err(err) => {
                    self.load_state = LoadState::Failed(err.to_string());
                    return;
                }
            }
        }

        if !reset {
            let snapshot = self.persistence.get_snapshot().await;
            if self.teardown.is_torn_down() {
                return;
            }
            if let Some(snapshot) = snapshot {
                log::debug!("restoring saved progress {snapshot:?}");
                self.state = std::mem::take(&mut self.state).restore_snapshot(&snapshot);
            }
        }
        self.load_state = LoadState::Ready;
    }

    /// Choose an option for the current question.
    ///
    /// Ignored unless the session is [`LoadState::Ready`].
    pub async fn on_select(&mut self, option: usize) {
        if self.load_state != LoadState::Ready {
            return;
        }
        self.state = std::mem::take(&mut self.state).select_option(option);
        self.persist_progress().await;
    }

    /// Move on; on completion the final results are stored and the saved
    /// progress dropped. Ignored unless the session is [`LoadState::Ready`].
    pub async fn on_advance(&mut self) {
        if self.load_state != LoadState::Ready {
            return;
        }
        let was_complete = self.state.is_complete();
        self.state = std::mem::take(&mut self.state).advance();

        if self.state.is_complete() && !was_complete {
            let results = QuizResults::new(
                u32::try_from(self.state.correct_count()).unwrap_or(u32::MAX),
                u32::try_from(self.state.total()).unwrap_or(u32::MAX),
            );
            log::info!("quiz complete: {}/{}", results.score, results.total);
            self.persistence.set_results(results).await;
            self.persistence.clear_snapshot().await;
            self.persistence.touch_last_active().await;
            self.settle_reset_flag().await;
        } else {
            self.persist_progress().await;
        }
    }

    /// Start over. Under [`ResetPolicy::KeepQuestions`] the same set can be
    /// replayed right away; otherwise the next [`Self::start`] fetches a new
    /// one.
    pub async fn on_reset_quiz(&mut self) {
        let keep = self.reset_policy.keeps_questions();
        self.state = std::mem::take(&mut self.state).reset(keep);
        self.persistence.clear_all(keep).await;
        if !keep {
            self.questions.clear_cache();
            self.load_state = LoadState::Idle;
        }
        self.persistence.set_reset_flag(true).await;
        self.reset_pending = true;
    }

    /// Leave the quiz entirely: everything saved is dropped and the next
    /// start begins from a fresh question set.
    pub async fn on_go_home(&mut self) {
        self.persistence.set_reset_flag(true).await;
        self.state = std::mem::take(&mut self.state).reset(false);
        self.persistence.clear_all(false).await;
        self.questions.clear_cache();
        self.load_state = LoadState::Idle;
        self.reset_pending = true;
    }

    /// Results of the last completed session, as saved.
    pub async fn last_results(&self) -> Option<QuizResults> {
        self.persistence.get_results().await
    }

    /// Epoch milliseconds of the last persisted user action.
    pub async fn last_active(&self) -> Option<i64> {
        self.persistence.last_active().await
    }

    async fn persist_progress(&mut self) {
        if self.persistence.set_snapshot(&self.state).await {
            self.persistence.touch_last_active().await;
            self.settle_reset_flag().await;
        }
    }

    // A snapshot written after a reset supersedes the pending flag.
    async fn settle_reset_flag(&mut self) {
        if self.reset_pending {
            self.persistence.set_reset_flag(false).await;
            self.reset_pending = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teardown_is_shared_between_handles() {
        let handle = TeardownHandle::default();
        let clone = handle.clone();
        assert!(!clone.is_torn_down());
        handle.teardown();
        assert!(clone.is_torn_down());
        handle.teardown();
        assert!(handle.is_torn_down());
    }
}
