use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use quiz_core::model::RawQuestion;

use crate::error::QuestionSourceError;

/// Where raw trivia records come from.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Retrieve the full list of raw records, in source order.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError` when the source cannot be read or its
    /// payload is not a list of records.
    async fn fetch_raw(&self) -> Result<Vec<RawQuestion>, QuestionSourceError>;
}

/// Accepted payload shapes: a bare array, or the trivia API envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPayload {
    List(Vec<RawQuestion>),
    Envelope {
        #[serde(default)]
        response_code: Option<i64>,
        results: Vec<RawQuestion>,
    },
}

/// Parse a question payload in either accepted shape.
///
/// # Errors
///
/// Returns `QuestionSourceError::Decode` when `body` matches neither shape.
pub fn parse_payload(body: &str) -> Result<Vec<RawQuestion>, QuestionSourceError> {
    match serde_json::from_str(body)? {
        RawPayload::List(records) => Ok(records),
        RawPayload::Envelope {
            response_code,
            results,
        } => {
            if let Some(code) = response_code.filter(|code| *code != 0) {
                log::warn!("question source envelope reported response_code {code}");
            }
            Ok(results)
        }
    }
}

//
// ─── HTTP ──────────────────────────────────────────────────────────────────────
//

/// Reads records from an HTTP endpoint with a single GET.
#[derive(Clone)]
pub struct HttpQuestionSource {
    client: Client,
    url: String,
}

impl HttpQuestionSource {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn fetch_raw(&self) -> Result<Vec<RawQuestion>, QuestionSourceError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(QuestionSourceError::HttpStatus(response.status()));
        }
        let body = response.text().await?;
        parse_payload(&body)
    }
}

//
// ─── FILE ──────────────────────────────────────────────────────────────────────
//

/// Reads records from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct FileQuestionSource {
    path: PathBuf,
}

impl FileQuestionSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl QuestionSource for FileQuestionSource {
    async fn fetch_raw(&self) -> Result<Vec<RawQuestion>, QuestionSourceError> {
        let body = tokio::fs::read_to_string(&self.path).await?;
        parse_payload(&body)
    }
}

//
// ─── STATIC ────────────────────────────────────────────────────────────────────
//

/// Serves a fixed list of records; useful for tests and offline play.
#[derive(Debug, Clone, Default)]
pub struct StaticQuestionSource {
    records: Vec<RawQuestion>,
}

impl StaticQuestionSource {
    #[must_use]
    pub fn new(records: Vec<RawQuestion>) -> Self {
        Self { records }
    }

    /// Build a source from a JSON payload in either accepted shape.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError::Decode` for malformed payloads.
    pub fn from_json(body: &str) -> Result<Self, QuestionSourceError> {
        parse_payload(body).map(Self::new)
    }
}

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    async fn fetch_raw(&self) -> Result<Vec<RawQuestion>, QuestionSourceError> {
        Ok(self.records.clone())
    }
}
