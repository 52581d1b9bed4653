#![forbid(unsafe_code)]

pub mod bank;
pub mod error;
pub mod sessions;
pub mod timer;

pub use quiz_core::Clock;

pub use bank::{builtin_bank, load_bank, parse_bank};
pub use error::{BankLoadError, HistoryError, SessionError};
pub use timer::CountdownTimer;

pub use sessions::{
    AttemptHistoryService, AttemptListItem, AttemptReview, CompletedAttempt, PersistenceStatus,
    QuestionReview, QuizEvent, QuizInput, QuizRunner, QuizSessionService, SessionProgress,
    SessionStep,
};
