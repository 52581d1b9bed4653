use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::{AttemptId, QuestionBank};
use crate::scorer::{self, AnswerMap, TimeSpentMap};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreOutOfRange { score: u32, total: u32 },

    #[error("attempt has no questions")]
    NoQuestions,

    #[error("too many questions for a single attempt: {len}")]
    TooManyQuestions { len: usize },
}

/// Outcome of one completed quiz session.
///
/// Built once when the session completes and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    id: AttemptId,
    date: DateTime<Utc>,
    score: u32,
    total_questions: u32,
    answers: AnswerMap,
    time_spent: TimeSpentMap,
}

impl Attempt {
    /// Build the attempt for a finished session, scoring it against `bank`.
    ///
    /// `date` is the moment the session started.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::TooManyQuestions` if the bank size cannot fit in `u32`.
    pub fn from_session(
        id: AttemptId,
        date: DateTime<Utc>,
        bank: &QuestionBank,
        answers: AnswerMap,
        time_spent: TimeSpentMap,
    ) -> Result<Self, AttemptError> {
        let total_questions = u32::try_from(bank.len())
            .map_err(|_| AttemptError::TooManyQuestions { len: bank.len() })?;
        let score = scorer::score(&answers, bank);

        Self::from_persisted(id, date, score, total_questions, answers, time_spent)
    }

    /// Rehydrate an attempt from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NoQuestions` if `total_questions` is zero and
    /// `AttemptError::ScoreOutOfRange` if `score > total_questions`.
    pub fn from_persisted(
        id: AttemptId,
        date: DateTime<Utc>,
        score: u32,
        total_questions: u32,
        answers: AnswerMap,
        time_spent: TimeSpentMap,
    ) -> Result<Self, AttemptError> {
        if total_questions == 0 {
            return Err(AttemptError::NoQuestions);
        }
        if score > total_questions {
            return Err(AttemptError::ScoreOutOfRange {
                score,
                total: total_questions,
            });
        }

        Ok(Self {
            id,
            date,
            score,
            total_questions,
            answers,
            time_spent,
        })
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn time_spent(&self) -> &TimeSpentMap {
        &self.time_spent
    }

    /// Sum of seconds spent across all questions.
    #[must_use]
    pub fn total_time_secs(&self) -> u64 {
        self.time_spent.values().map(|&s| u64::from(s)).sum()
    }

    /// Score as a whole percentage, rounded half away from zero.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        let scaled = u64::from(self.score) * 100;
        let total = u64::from(self.total_questions);
        u32::try_from((scaled * 2 + total) / (total * 2)).unwrap_or(100)
    }
}
