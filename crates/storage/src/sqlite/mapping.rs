use quiz_core::model::{Attempt, AttemptId};
use quiz_core::{AnswerMap, TimeSpentMap};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn answers_to_json(answers: &AnswerMap) -> Result<String, StorageError> {
    serde_json::to_string(answers).map_err(ser)
}

pub(crate) fn time_spent_to_json(time_spent: &TimeSpentMap) -> Result<String, StorageError> {
    serde_json::to_string(time_spent).map_err(ser)
}

pub(crate) fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<Attempt, StorageError> {
    let id = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse::<AttemptId>()
        .map_err(ser)?;
    let date = row.try_get("date").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total_questions = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let answers: AnswerMap =
        serde_json::from_str(&row.try_get::<String, _>("answers").map_err(ser)?).map_err(ser)?;
    let time_spent: TimeSpentMap =
        serde_json::from_str(&row.try_get::<String, _>("time_spent").map_err(ser)?)
            .map_err(ser)?;

    Attempt::from_persisted(id, date, score, total_questions, answers, time_spent).map_err(ser)
}
