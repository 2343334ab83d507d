mod ids;
mod question;
mod results;
mod session;

pub use ids::QuestionId;
pub use question::{Difficulty, Question, QuestionError, RawQuestion};
pub use results::QuizResults;
pub use session::{AdvancePolicy, SessionSnapshot, SessionState};
