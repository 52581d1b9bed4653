mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{HistoryError, SessionError};
pub use progress::SessionProgress;
pub use service::{CompletedAttempt, PersistenceStatus, QuizSessionService, SessionStep};
pub use view::{AttemptHistoryService, AttemptListItem, AttemptReview, QuestionReview};
pub use workflow::{QuizEvent, QuizInput, QuizRunner};
