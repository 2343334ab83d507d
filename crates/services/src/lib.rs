#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod persistence;
pub mod question_service;
pub mod question_source;
pub mod view;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use config::{QuizConfig, ResetPolicy, RetryPolicy};
pub use error::{AppServicesError, QuestionSourceError, QuizLoadError};
pub use orchestrator::{QuizOrchestrator, TeardownHandle};
pub use persistence::PersistenceGateway;
pub use question_service::QuestionService;
pub use question_source::{
    FileQuestionSource, HttpQuestionSource, QuestionSource, StaticQuestionSource,
};
pub use view::{Feedback, LoadState, NextAction, QuizView};
