use thiserror::Error;

use crate::model::{AttemptError, BankError, QuestionError, SettingsError};
use crate::quiz::TransitionError;

/// Any domain error raised by this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}
