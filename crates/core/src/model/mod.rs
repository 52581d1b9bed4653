mod answer;
mod attempt;
mod bank;
mod ids;
mod question;
mod session;
mod settings;

pub use answer::{AnswerKind, AnswerValue};
pub use attempt::{Attempt, AttemptError};
pub use bank::{BankError, QuestionBank};
pub use ids::{AttemptId, ParseIdError, QuestionId};
pub use question::{Question, QuestionError, QuestionKind};
pub use session::{SessionPhase, SessionState};
pub use settings::{
    DEFAULT_TIME_LIMIT_SECS, MAX_TIME_LIMIT_SECS, QuizSettings, SettingsError,
};
