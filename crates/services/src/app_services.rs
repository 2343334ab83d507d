use std::sync::Arc;

use storage::repository::{KeyValueStore, Scope, Storage};

use crate::config::QuizConfig;
use crate::error::AppServicesError;
use crate::orchestrator::QuizOrchestrator;
use crate::persistence::PersistenceGateway;
use crate::question_service::QuestionService;
use crate::question_source::{HttpQuestionSource, QuestionSource};
use crate::Clock;

/// Assembles the quiz services around one storage backend and one source.
#[derive(Clone)]
pub struct AppServices {
    config: QuizConfig,
    kv: Arc<dyn KeyValueStore>,
    questions: Arc<QuestionService>,
    persistence: PersistenceGateway,
}

impl AppServices {
    #[must_use]
    pub fn new(
        config: QuizConfig,
        clock: Clock,
        kv: Arc<dyn KeyValueStore>,
        source: Arc<dyn QuestionSource>,
    ) -> Self {
        let questions = Arc::new(QuestionService::new(
            source,
            config.retry,
            config.question_limit,
        ));
        let persistence = PersistenceGateway::new(Arc::clone(&kv), clock);
        Self {
            config,
            kv,
            questions,
            persistence,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// When `source` is `None` the HTTP source at `config.source_url` is used.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        config: QuizConfig,
        clock: Clock,
        source: Option<Arc<dyn QuestionSource>>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let source = source
            .unwrap_or_else(|| Arc::new(HttpQuestionSource::new(config.source_url.clone())));
        Ok(Self::new(config, clock, storage.kv, source))
    }

    /// Forget session-scoped entries, as when a new browsing session opens.
    pub async fn begin_browser_session(&self) {
        if let Err(err) = self.kv.clear_scope(Scope::Session).await {
            log::error!("failed to clear session storage: {err}");
        }
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn persistence(&self) -> PersistenceGateway {
        self.persistence.clone()
    }

    #[must_use]
    pub fn question_service(&self) -> Arc<QuestionService> {
        Arc::clone(&self.questions)
    }

    /// A new orchestrator sharing this instance's cache and storage.
    #[must_use]
    pub fn orchestrator(&self) -> QuizOrchestrator {
        QuizOrchestrator::new(
            &self.config,
            Arc::clone(&self.questions),
            self.persistence.clone(),
        )
    }
}
