//! Shared error types for the services crate.

use thiserror::Error;

/// Errors emitted by a single attempt to read the question source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionSourceError {
    #[error("question source responded with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("question payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Loading a question set failed for good. This is the only error the
/// presentation layer ever sees.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizLoadError {
    #[error("failed to load questions after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: QuestionSourceError,
    },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] storage::sqlite::SqliteInitError),
}
