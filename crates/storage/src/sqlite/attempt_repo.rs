use quiz_core::model::{Attempt, AttemptId};

use super::SqliteRepository;
use super::mapping::{answers_to_json, map_attempt_row, time_spent_to_json};
use crate::repository::{AttemptRepository, StorageError};

fn write_error(id: AttemptId, e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict(id),
        _ => StorageError::Connection(e.to_string()),
    }
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn save_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO attempts (
                    id, date, score, total_questions, answers, time_spent
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(attempt.id().to_string())
        .bind(attempt.date())
        .bind(i64::from(attempt.score()))
        .bind(i64::from(attempt.total_questions()))
        .bind(answers_to_json(attempt.answers())?)
        .bind(time_spent_to_json(attempt.time_spent())?)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(attempt.id(), e))?;

        Ok(())
    }

    async fn list_attempts(&self) -> Result<Vec<Attempt>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, date, score, total_questions, answers, time_spent
                FROM attempts
                ORDER BY date DESC, id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }
}
