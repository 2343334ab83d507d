use std::env;
use std::time::Duration;

use quiz_core::mapping::MAX_SESSION_QUESTIONS;
use quiz_core::model::AdvancePolicy;

const DEFAULT_SOURCE_URL: &str = "http://localhost:3000/api/questions";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_PASS_MARK: u32 = 10;

/// Exponential backoff for question fetches.
///
/// The first attempt is followed by up to `max_retries` more; the wait before
/// retry `n` (0-based) is `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Retries without waiting; for tests and local fixtures.
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO)
    }

    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2_u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        )
    }
}

/// What an explicit reset does with the loaded question set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetPolicy {
    /// Drop the set; the next start fetches and shuffles a new one.
    #[default]
    DiscardQuestions,
    /// Keep the set for an immediate replay in the same order.
    KeepQuestions,
}

impl ResetPolicy {
    #[must_use]
    pub fn keeps_questions(self) -> bool {
        matches!(self, ResetPolicy::KeepQuestions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    pub source_url: String,
    pub question_limit: usize,
    pub retry: RetryPolicy,
    pub reset_policy: ResetPolicy,
    pub advance_policy: AdvancePolicy,
    pub pass_mark: u32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.into(),
            question_limit: MAX_SESSION_QUESTIONS,
            retry: RetryPolicy::default(),
            reset_policy: ResetPolicy::default(),
            advance_policy: AdvancePolicy::default(),
            pass_mark: DEFAULT_PASS_MARK,
        }
    }
}

impl QuizConfig {
    /// Read overrides from `QUIZ_*` environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let source_url = env::var("QUIZ_SOURCE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.source_url);
        let question_limit = parse_env("QUIZ_QUESTION_LIMIT").unwrap_or(defaults.question_limit);
        let max_retries = parse_env("QUIZ_MAX_RETRIES").unwrap_or(defaults.retry.max_retries);
        let base_delay = parse_env("QUIZ_RETRY_DELAY_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry.base_delay);
        let reset_policy = match parse_env::<bool>("QUIZ_KEEP_QUESTIONS_ON_RESET") {
            Some(true) => ResetPolicy::KeepQuestions,
            Some(false) => ResetPolicy::DiscardQuestions,
            None => defaults.reset_policy,
        };
        let advance_policy = match env::var("QUIZ_ADVANCE_POLICY").ok().as_deref() {
            Some("confirm") => AdvancePolicy::ConfirmThenAdvance,
            Some("reveal-on-select") => AdvancePolicy::RevealOnSelect,
            _ => defaults.advance_policy,
        };
        let pass_mark = parse_env("QUIZ_PASS_MARK").unwrap_or(defaults.pass_mark);

        Self {
            source_url,
            question_limit: question_limit.clamp(1, MAX_SESSION_QUESTIONS),
            retry: RetryPolicy::new(max_retries, base_delay),
            reset_policy,
            advance_policy,
            pass_mark,
        }
    }

    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    #[must_use]
    pub fn with_question_limit(mut self, limit: usize) -> Self {
        self.question_limit = limit.clamp(1, MAX_SESSION_QUESTIONS);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.reset_policy = policy;
        self
    }

    #[must_use]
    pub fn with_advance_policy(mut self, policy: AdvancePolicy) -> Self {
        self.advance_policy = policy;
        self
    }

    #[must_use]
    pub fn with_pass_mark(mut self, pass_mark: u32) -> Self {
        self.pass_mark = pass_mark;
        self
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|raw| raw.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_retry() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.delay_for(0), Duration::from_millis(1000));
        assert_eq!(retry.delay_for(1), Duration::from_millis(2000));
        assert_eq!(retry.delay_for(2), Duration::from_millis(4000));
        assert_eq!(retry.max_attempts(), 4);
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let retry = RetryPolicy::new(64, Duration::from_secs(1));
        assert_eq!(retry.delay_for(40), Duration::from_secs(u64::from(u32::MAX)));
        assert_eq!(RetryPolicy::immediate(3).delay_for(2), Duration::ZERO);
    }

    #[test]
    fn defaults_match_browser_client() {
        let config = QuizConfig::default();
        assert_eq!(config.question_limit, 20);
        assert_eq!(config.pass_mark, 10);
        assert_eq!(config.reset_policy, ResetPolicy::DiscardQuestions);
        assert_eq!(config.advance_policy, AdvancePolicy::RevealOnSelect);
    }

    #[test]
    fn question_limit_is_clamped() {
        assert_eq!(QuizConfig::default().with_question_limit(0).question_limit, 1);
        assert_eq!(QuizConfig::default().with_question_limit(99).question_limit, 20);
    }
}
