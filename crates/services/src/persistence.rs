//! Durable survival of a quiz session across reloads.
//!
//! Every read and write is fail-soft: storage errors and malformed JSON are
//! logged and reported as "absent" or "not written", never as errors.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use quiz_core::Clock;
use quiz_core::model::{Question, QuizResults, SessionSnapshot, SessionState};
use storage::repository::{KeyValueStore, Scope};

pub const QUESTIONS_KEY: &str = "quiz_questions";
pub const STATE_KEY: &str = "quiz_state";
pub const RESULTS_KEY: &str = "quiz_results";
pub const RESET_FLAG_KEY: &str = "quiz_should_reset";
pub const LAST_ACTIVE_KEY: &str = "quiz_last_active";

const RESET_FLAG_VALUE: &str = "true";

#[derive(Clone)]
pub struct PersistenceGateway {
    kv: Arc<dyn KeyValueStore>,
    clock: Clock,
}

impl PersistenceGateway {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Clock) -> Self {
        Self { kv, clock }
    }

    //
    // ─── QUESTIONS ─────────────────────────────────────────────────────────
    //

    /// Stored question set, if present and well-formed.
    pub async fn get_questions(&self) -> Option<Vec<Question>> {
        let questions: Vec<Question> = self.read_json(Scope::Durable, QUESTIONS_KEY).await?;
        if questions.iter().all(Question::is_consistent) {
            Some(questions)
        } else {
            log::warn!("stored question set has out-of-range answers; ignoring it");
            None
        }
    }

    pub async fn set_questions(&self, questions: &[Question]) -> bool {
        self.write_json(Scope::Durable, QUESTIONS_KEY, &questions).await
    }

    //
    // ─── SNAPSHOT ──────────────────────────────────────────────────────────
    //

    pub async fn get_snapshot(&self) -> Option<SessionSnapshot> {
        self.read_json(Scope::Durable, STATE_KEY).await
    }

    /// Persist the snapshot of `state`.
    ///
    /// Skipped (returns `false`) for completed sessions and sessions without
    /// questions.
    pub async fn set_snapshot(&self, state: &SessionState) -> bool {
        if state.is_complete() || state.questions().is_empty() {
            return false;
        }
        self.write_json(Scope::Durable, STATE_KEY, &state.snapshot())
            .await
    }

    pub async fn clear_snapshot(&self) {
        self.remove(Scope::Durable, STATE_KEY).await;
    }

    //
    // ─── RESULTS ───────────────────────────────────────────────────────────
    //

    pub async fn get_results(&self) -> Option<QuizResults> {
        self.read_json(Scope::Durable, RESULTS_KEY).await
    }

    /// Persist final results stamped with the current time.
    pub async fn set_results(&self, results: QuizResults) -> bool {
        let stamped = results.with_timestamp(self.clock.now_millis());
        self.write_json(Scope::Durable, RESULTS_KEY, &stamped).await
    }

    //
    // ─── RESET FLAG ────────────────────────────────────────────────────────
    //

    pub async fn should_reset(&self) -> bool {
        match self.kv.get(Scope::Session, RESET_FLAG_KEY).await {
            Ok(value) => value.as_deref() == Some(RESET_FLAG_VALUE),
            Err(err) => {
                log::error!("failed to read {RESET_FLAG_KEY}: {err}");
                false
            }
        }
    }

    pub async fn set_reset_flag(&self, should_reset: bool) {
        if should_reset {
            if let Err(err) = self
                .kv
                .set(Scope::Session, RESET_FLAG_KEY, RESET_FLAG_VALUE)
                .await
            {
                log::error!("failed to set {RESET_FLAG_KEY}: {err}");
            }
        } else {
            self.remove(Scope::Session, RESET_FLAG_KEY).await;
        }
    }

    //
    // ─── HOUSEKEEPING ──────────────────────────────────────────────────────
    //

    /// Remove the snapshot and results, and the question set unless
    /// `keep_questions`.
    pub async fn clear_all(&self, keep_questions: bool) {
        self.remove(Scope::Durable, STATE_KEY).await;
        self.remove(Scope::Durable, RESULTS_KEY).await;
        if !keep_questions {
            self.remove(Scope::Durable, QUESTIONS_KEY).await;
        }
    }

    /// Record now as the time of the last user action.
    pub async fn touch_last_active(&self) -> bool {
        self.write_json(Scope::Durable, LAST_ACTIVE_KEY, &self.clock.now_millis())
            .await
    }

    /// Epoch milliseconds of the last user action, if recorded.
    pub async fn last_active(&self) -> Option<i64> {
        self.read_json(Scope::Durable, LAST_ACTIVE_KEY).await
    }

    //
    // ─── HELPERS ───────────────────────────────────────────────────────────
    //

    async fn read_json<T: DeserializeOwned>(&self, scope: Scope, key: &str) -> Option<T> {
        let raw = match self.kv.get(scope, key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                log::error!("failed to read {key} from {scope} storage: {err}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("ignoring malformed {key} in {scope} storage: {err}");
                None
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, scope: Scope, key: &str, value: &T) -> bool {
        let body = match serde_json::to_string(value) {
            Ok(body) => body,
            Err(err) => {
                log::error!("failed to serialize {key}: {err}");
                return false;
            }
        };
        match self.kv.set(scope, key, &body).await {
            Ok(()) => true,
            Err(err) => {
                log::error!("failed to write {key} to {scope} storage: {err}");
                false
            }
        }
    }

    async fn remove(&self, scope: Scope, key: &str) {
        if let Err(err) = self.kv.remove(scope, key).await {
            log::error!("failed to remove {key} from {scope} storage: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_core::model::{Difficulty, QuestionId};
    use quiz_core::time::{FIXED_TEST_TIMESTAMP, fixed_clock};
    use storage::repository::{InMemoryStore, StorageError};

    struct FailingStore;

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get(&self, _: Scope, _: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Connection("storage disabled".into()))
        }
        async fn set(&self, _: Scope, _: &str, _: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("quota exceeded".into()))
        }
        async fn remove(&self, _: Scope, _: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("storage disabled".into()))
        }
        async fn clear_scope(&self, _: Scope) -> Result<(), StorageError> {
            Err(StorageError::Connection("storage disabled".into()))
        }
    }

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    QuestionId::from_position(i),
                    format!("Q{i}"),
                    vec!["a".into(), "b".into()],
                    1,
                    "General",
                    Difficulty::Easy,
                )
            })
            .collect()
    }

    fn gateway() -> (PersistenceGateway, InMemoryStore) {
        let store = InMemoryStore::new();
        (
            PersistenceGateway::new(Arc::new(store.clone()), fixed_clock()),
            store,
        )
    }

    #[tokio::test]
    async fn questions_round_trip() {
        let (gateway, _) = gateway();
        assert!(gateway.get_questions().await.is_none());
        assert!(gateway.set_questions(&questions(3)).await);
        assert_eq!(gateway.get_questions().await, Some(questions(3)));
    }

    #[tokio::test]
    async fn snapshot_round_trip_restores_progress() {
        let (gateway, _) = gateway();
        let state = SessionState::default()
            .load_questions(questions(3))
            .select_option(1)
            .advance()
            .select_option(0);
        assert!(gateway.set_snapshot(&state).await);

        let snapshot = gateway.get_snapshot().await.unwrap();
        let restored = SessionState::default()
            .load_questions(questions(3))
            .restore_snapshot(&snapshot);
        assert_eq!(restored.current_index(), 1);
        assert_eq!(restored.correct_count(), 1);
        assert_eq!(restored.selected_option(), Some(0));
        assert!(restored.is_revealed());
    }

    #[tokio::test]
    async fn snapshot_write_skipped_when_empty_or_complete() {
        let (gateway, store) = gateway();
        assert!(!gateway.set_snapshot(&SessionState::default()).await);

        let done = SessionState::default()
            .load_questions(questions(1))
            .select_option(1)
            .advance();
        assert!(done.is_complete());
        assert!(!gateway.set_snapshot(&done).await);
        assert!(store.is_empty(Scope::Durable));
    }

    #[tokio::test]
    async fn results_are_stamped() {
        let (gateway, _) = gateway();
        assert!(gateway.set_results(QuizResults::new(4, 5)).await);
        let results = gateway.get_results().await.unwrap();
        assert_eq!(results.score, 4);
        assert_eq!(results.total, 5);
        assert_eq!(results.timestamp, Some(FIXED_TEST_TIMESTAMP * 1000));
    }

    #[tokio::test]
    async fn reset_flag_lives_in_session_scope() {
        let (gateway, store) = gateway();
        assert!(!gateway.should_reset().await);

        gateway.set_reset_flag(true).await;
        assert!(gateway.should_reset().await);
        assert_eq!(
            store.get(Scope::Session, RESET_FLAG_KEY).await.unwrap().as_deref(),
            Some("true")
        );
        assert!(store.is_empty(Scope::Durable));

        gateway.set_reset_flag(false).await;
        assert!(!gateway.should_reset().await);
        assert!(store.is_empty(Scope::Session));
    }

    #[tokio::test]
    async fn clear_all_respects_keep_questions() {
        let (gateway, _) = gateway();
        let state = SessionState::default().load_questions(questions(2)).select_option(0);
        gateway.set_questions(state.questions()).await;
        gateway.set_snapshot(&state).await;
        gateway.set_results(QuizResults::new(1, 2)).await;

        gateway.clear_all(true).await;
        assert!(gateway.get_snapshot().await.is_none());
        assert!(gateway.get_results().await.is_none());
        assert!(gateway.get_questions().await.is_some());

        gateway.clear_all(false).await;
        assert!(gateway.get_questions().await.is_none());
    }

    #[tokio::test]
    async fn malformed_json_reads_as_absent() {
        let (gateway, store) = gateway();
        store.set(Scope::Durable, STATE_KEY, "{not json").await.unwrap();
        store.set(Scope::Durable, RESULTS_KEY, r#"{"score":"many"}"#).await.unwrap();
        store.set(Scope::Durable, QUESTIONS_KEY, "42").await.unwrap();

        assert!(gateway.get_snapshot().await.is_none());
        assert!(gateway.get_results().await.is_none());
        assert!(gateway.get_questions().await.is_none());
    }

    #[tokio::test]
    async fn tampered_question_set_is_ignored() {
        let (gateway, store) = gateway();
        store
            .set(
                Scope::Durable,
                QUESTIONS_KEY,
                r#"[{"id":1,"question":"Q","options":["a"],"correctIndex":3}]"#,
            )
            .await
            .unwrap();
        assert!(gateway.get_questions().await.is_none());
    }

    #[tokio::test]
    async fn storage_failures_are_swallowed() {
        let gateway = PersistenceGateway::new(Arc::new(FailingStore), fixed_clock());
        let state = SessionState::default().load_questions(questions(1));

        assert!(!gateway.set_questions(state.questions()).await);
        assert!(!gateway.set_snapshot(&state).await);
        assert!(!gateway.set_results(QuizResults::new(0, 1)).await);
        assert!(!gateway.touch_last_active().await);
        gateway.set_reset_flag(true).await;
        gateway.clear_all(false).await;

        assert!(gateway.get_questions().await.is_none());
        assert!(gateway.get_snapshot().await.is_none());
        assert!(gateway.get_results().await.is_none());
        assert!(gateway.last_active().await.is_none());
        assert!(!gateway.should_reset().await);
    }

    #[tokio::test]
    async fn last_active_uses_clock() {
        let (gateway, _) = gateway();
        assert!(gateway.touch_last_active().await);
        assert_eq!(gateway.last_active().await, Some(FIXED_TEST_TIMESTAMP * 1000));
    }
}
