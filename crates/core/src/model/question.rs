use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("unknown difficulty: {0:?}")]
    UnknownDifficulty(String),
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

/// Difficulty label attached to a trivia question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Lenient conversion used for raw records: missing or unrecognized
    /// values fall back to `Easy`.
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }

    /// Number of stars shown next to the question.
    #[must_use]
    pub fn stars(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(QuestionError::UnknownDifficulty(s.to_owned())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── RAW RECORD ───────────────────────────────────────────────────────────────
//

/// A trivia record exactly as the question source returns it.
///
/// Every field may be missing; text fields are still percent-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawQuestion {
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub difficulty: Option<String>,
    pub question: Option<String>,
    pub correct_answer: Option<String>,
    pub incorrect_answers: Option<Vec<String>>,
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A normalized question with its options in their final, shuffled order.
///
/// Serialized with the field names the browser client stored under
/// `quiz_questions`, so persisted sets stay readable by both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    #[serde(rename = "question")]
    text: String,
    options: Vec<String>,
    #[serde(rename = "correctIndex")]
    correct_index: usize,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    difficulty: Difficulty,
}

fn default_category() -> String {
    crate::text::DEFAULT_CATEGORY.to_owned()
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        category: impl Into<String>,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            options,
            correct_index,
            category: category.into(),
            difficulty,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_index
    }

    /// Returns true when `correct_index` points at an existing option.
    ///
    /// Always true for mapped questions; used to reject tampered persisted sets.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.correct_index < self.options.len()
    }
}
