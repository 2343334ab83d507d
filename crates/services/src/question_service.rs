use std::sync::{Arc, Mutex};

use quiz_core::mapping::prepare_session_questions;
use quiz_core::model::{Question, RawQuestion};

use crate::config::RetryPolicy;
use crate::error::{QuestionSourceError, QuizLoadError};
use crate::question_source::QuestionSource;

/// Fetches, maps and caches the question set for a session.
///
/// A successful fetch is kept in memory and served again until
/// [`QuestionService::clear_cache`] is called.
pub struct QuestionService {
    source: Arc<dyn QuestionSource>,
    retry: RetryPolicy,
    limit: usize,
    cache: Mutex<Option<Vec<Question>>>,
}

impl QuestionService {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionSource>, retry: RetryPolicy, limit: usize) -> Self {
        Self {
            source,
            retry,
            limit,
            cache: Mutex::new(None),
        }
    }

    /// Return the cached set, or fetch one with retries and cache it.
    ///
    /// The fetched records are mapped, shuffled and truncated to the
    /// configured limit.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoadError::Exhausted` once every attempt has failed.
    pub async fn fetch_questions(&self) -> Result<Vec<Question>, QuizLoadError> {
        if let Some(cached) = self.cached() {
            log::debug!("serving {} cached questions", cached.len());
            return Ok(cached);
        }

        let raw = self.fetch_with_retry().await?;
        let questions = prepare_session_questions(&raw, self.limit, &mut rand::rng());
        log::info!(
            "loaded {} questions from {} source records",
            questions.len(),
            raw.len()
        );

        if let Ok(mut guard) = self.cache.lock() {
            *guard = Some(questions.clone());
        }
        Ok(questions)
    }

    pub fn clear_cache(&self) {
        if let Ok(mut guard) = self.cache.lock() {
            *guard = None;
        }
    }

    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.cache.lock().is_ok_and(|guard| guard.is_some())
    }

    fn cached(&self) -> Option<Vec<Question>> {
        self.cache.lock().ok().and_then(|guard| guard.clone())
    }

    async fn fetch_with_retry(&self) -> Result<Vec<RawQuestion>, QuizLoadError> {
        let mut retry = 0;
        loop {
            match self.source.fetch_raw().await {
                Ok(raw) => return Ok(raw),
                Err(err) if retry < self.retry.max_retries => {
                    let delay = self.retry.delay_for(retry);
                    log::warn!(
                        "question fetch attempt {} failed: {err}; retrying in {delay:?}",
                        retry + 1
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) => return Err(exhausted(self.retry.max_attempts(), err)),
            }
        }
    }
}

fn exhausted(attempts: u32, last: QuestionSourceError) -> QuizLoadError {
    log::error!("giving up on question fetch after {attempts} attempts: {last}");
    QuizLoadError::Exhausted { attempts, last }
}
