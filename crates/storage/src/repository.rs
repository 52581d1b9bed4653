use async_trait::async_trait;
use quiz_core::model::{Attempt, AttemptId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("attempt {0} is already stored")]
    Conflict(AttemptId),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable store for completed attempts.
///
/// Attempts are keyed by id and immutable once saved; there is no update or
/// delete.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Persist a new attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if an attempt with the same id exists,
    /// or other storage errors if the write fails.
    async fn save_attempt(&self, attempt: &Attempt) -> Result<(), StorageError>;

    /// Load every stored attempt. Order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_attempts(&self) -> Result<Vec<Attempt>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    attempts: Arc<Mutex<HashMap<AttemptId, Attempt>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn save_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.contains_key(&attempt.id()) {
            return Err(StorageError::Conflict(attempt.id()));
        }
        guard.insert(attempt.id(), attempt.clone());
        Ok(())
    }

    async fn list_attempts(&self) -> Result<Vec<Attempt>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values().cloned().collect())
    }
}

/// Repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let attempts: Arc<dyn AttemptRepository> = Arc::new(InMemoryRepository::new());
        Self { attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerValue, QuestionId};
    use quiz_core::time::fixed_now;
    use quiz_core::{AnswerMap, TimeSpentMap};

    fn build_attempt(score: u32) -> Attempt {
        let mut answers = AnswerMap::new();
        answers.insert(QuestionId::new(1), AnswerValue::Integer(40));
        let mut time = TimeSpentMap::new();
        time.insert(QuestionId::new(1), 5);
        time.insert(QuestionId::new(2), 30);
        Attempt::from_persisted(AttemptId::generate(), fixed_now(), score, 2, answers, time)
            .unwrap()
    }

    #[tokio::test]
    async fn lists_what_was_saved() {
        let repo = InMemoryRepository::new();
        let attempt = build_attempt(1);
        repo.save_attempt(&attempt).await.unwrap();

        let listed = repo.list_attempts().await.unwrap();
        assert_eq!(listed, vec![attempt]);
    }

    #[tokio::test]
    async fn duplicate_id_conflicts_and_keeps_original() {
        let repo = InMemoryRepository::new();
        let attempt = build_attempt(1);
        repo.save_attempt(&attempt).await.unwrap();

        let err = repo.save_attempt(&attempt).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(id) if id == attempt.id()));
        assert_eq!(
            err.to_string(),
            format!("attempt {} is already stored", attempt.id())
        );
        assert_eq!(repo.list_attempts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn storage_clones_share_the_same_store() {
        let storage = Storage::in_memory();
        let other = storage.clone();
        storage.attempts.save_attempt(&build_attempt(0)).await.unwrap();
        storage.attempts.save_attempt(&build_attempt(2)).await.unwrap();
        assert_eq!(other.attempts.list_attempts().await.unwrap().len(), 2);
    }
}
