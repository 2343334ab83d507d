use serde::{Deserialize, Serialize};

use crate::stats::percent_of;

/// Final outcome of a completed session, as stored under `quiz_results`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResults {
    pub score: u32,
    pub total: u32,
    /// Epoch milliseconds of the write; stamped by the persistence layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl QuizResults {
    #[must_use]
    pub fn new(score: u32, total: u32) -> Self {
        Self {
            score,
            total,
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// A session passes when at least `pass_mark` answers were correct.
    #[must_use]
    pub fn passed(&self, pass_mark: u32) -> bool {
        self.score >= pass_mark
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        percent_of(self.score as usize, self.total as usize)
    }
}
