//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use quiz_core::TransitionError;
use quiz_core::model::AttemptId;
use storage::repository::StorageError;

/// Errors emitted by the quiz session service.
///
/// Every variant is recoverable: the session is left exactly as it was.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Errors emitted by `AttemptHistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("attempt {0} not found")]
    NotFound(AttemptId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading a question bank.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankLoadError {
    #[error("cannot read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed question bank: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid question bank: {0}")]
    Invalid(#[from] quiz_core::Error),
}
