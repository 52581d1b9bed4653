use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use quiz_core::model::{AnswerValue, Attempt, AttemptId, QuestionBank, QuestionId};
use storage::repository::AttemptRepository;

use crate::error::HistoryError;

/// Presentation-agnostic list item for a stored attempt.
///
/// No pre-formatted strings; the caller decides how to render dates and
/// durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptListItem {
    pub id: AttemptId,
    pub date: DateTime<Utc>,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub total_time_secs: u64,
}

impl AttemptListItem {
    #[must_use]
    pub fn from_attempt(attempt: &Attempt) -> Self {
        Self {
            id: attempt.id(),
            date: attempt.date(),
            score: attempt.score(),
            total: attempt.total_questions(),
            percentage: attempt.percentage(),
            total_time_secs: attempt.total_time_secs(),
        }
    }
}

/// One question of a reviewed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionReview {
    pub question_id: QuestionId,
    pub prompt: String,
    pub submitted: Option<AnswerValue>,
    pub correct_answer: AnswerValue,
    pub is_correct: bool,
    /// `None` when the question was skipped without expiring.
    pub time_spent: Option<u32>,
}

/// Per-question breakdown of a stored attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptReview {
    pub summary: AttemptListItem,
    pub questions: Vec<QuestionReview>,
    pub total_time_secs: u64,
    /// Rounded mean over the questions that have a recorded time.
    pub average_time_secs: u32,
}

impl AttemptReview {
    /// Pair an attempt with the bank it was taken against.
    ///
    /// Rows follow bank order; questions the bank no longer has are left out.
    #[must_use]
    pub fn build(attempt: &Attempt, bank: &QuestionBank) -> Self {
        let questions = bank
            .iter()
            .map(|question| {
                let submitted = attempt.answers().get(&question.id()).cloned();
                let is_correct = submitted
                    .as_ref()
                    .is_some_and(|answer| question.is_correct(answer));
                QuestionReview {
                    question_id: question.id(),
                    prompt: question.prompt().to_owned(),
                    submitted,
                    correct_answer: question.correct_answer().clone(),
                    is_correct,
                    time_spent: attempt.time_spent().get(&question.id()).copied(),
                }
            })
            .collect();

        let total_time_secs = attempt.total_time_secs();
        let timed = attempt.time_spent().len() as u64;
        let average_time_secs = if timed == 0 {
            0
        } else {
            u32::try_from((total_time_secs + timed / 2) / timed).unwrap_or(u32::MAX)
        };

        Self {
            summary: AttemptListItem::from_attempt(attempt),
            questions,
            total_time_secs,
            average_time_secs,
        }
    }
}

/// Read side over the attempt store: history list and per-attempt review.
#[derive(Clone)]
pub struct AttemptHistoryService {
    attempts: Arc<dyn AttemptRepository>,
    bank: Arc<QuestionBank>,
}

impl AttemptHistoryService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>, bank: Arc<QuestionBank>) -> Self {
        Self { attempts, bank }
    }

    /// All stored attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` on repository failures.
    pub async fn list_attempts(&self) -> Result<Vec<AttemptListItem>, HistoryError> {
        let mut attempts = self.attempts.list_attempts().await?;
        sort_newest_first(&mut attempts);
        Ok(attempts.iter().map(AttemptListItem::from_attempt).collect())
    }

    /// Load one attempt by id.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::NotFound` for an unknown id, or
    /// `HistoryError::Storage` on repository failures.
    pub async fn find_attempt(&self, id: AttemptId) -> Result<Attempt, HistoryError> {
        self.attempts
            .list_attempts()
            .await?
            .into_iter()
            .find(|attempt| attempt.id() == id)
            .ok_or(HistoryError::NotFound(id))
    }

    /// Per-question review of a stored attempt.
    ///
    /// # Errors
    ///
    /// See [`AttemptHistoryService::find_attempt`].
    pub async fn review(&self, id: AttemptId) -> Result<AttemptReview, HistoryError> {
        let attempt = self.find_attempt(id).await?;
        Ok(AttemptReview::build(&attempt, &self.bank))
    }
}

fn sort_newest_first(attempts: &mut [Attempt]) {
    attempts.sort_by(|a, b| b.date().cmp(&a.date()).then_with(|| b.id().cmp(&a.id())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::Question;
    use quiz_core::time::fixed_now;
    use quiz_core::{AnswerMap, TimeSpentMap};
    use storage::repository::InMemoryRepository;

    fn bank() -> Arc<QuestionBank> {
        Arc::new(
            QuestionBank::new(vec![
                Question::integer(1, "12 + 28?", 40).unwrap(),
                Question::choice(2, "Pick B", ["A", "B"], "B").unwrap(),
                Question::integer(3, "2 * 3?", 6).unwrap(),
            ])
            .unwrap(),
        )
    }

    fn attempt(offset_secs: i64, answers: &[(u64, AnswerValue)], times: &[(u64, u32)]) -> Attempt {
        let answers: AnswerMap = answers
            .iter()
            .map(|(id, value)| (QuestionId::new(*id), value.clone()))
            .collect();
        let times: TimeSpentMap = times
            .iter()
            .map(|(id, secs)| (QuestionId::new(*id), *secs))
            .collect();
        Attempt::from_session(
            AttemptId::generate(),
            fixed_now() + Duration::seconds(offset_secs),
            &bank(),
            answers,
            times,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lists_newest_first_with_totals() {
        let repo = InMemoryRepository::new();
        let older = attempt(0, &[(1, AnswerValue::Integer(40))], &[(1, 5), (2, 30)]);
        let newer = attempt(
            60,
            &[(1, AnswerValue::Integer(40)), (2, AnswerValue::from("B"))],
            &[(1, 3), (2, 4)],
        );
        repo.save_attempt(&older).await.unwrap();
        repo.save_attempt(&newer).await.unwrap();

        let service = AttemptHistoryService::new(Arc::new(repo), bank());
        let items = service.list_attempts().await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, newer.id());
        assert_eq!(items[0].score, 2);
        assert_eq!(items[0].percentage, 67);
        assert_eq!(items[0].total_time_secs, 7);
        assert_eq!(items[1].id, older.id());
        assert_eq!(items[1].total_time_secs, 35);
    }

    #[tokio::test]
    async fn review_marks_each_question() {
        let repo = InMemoryRepository::new();
        let stored = attempt(
            0,
            &[(1, AnswerValue::Integer(40)), (2, AnswerValue::from("A"))],
            &[(1, 5), (2, 10), (3, 30)],
        );
        repo.save_attempt(&stored).await.unwrap();
        let service = AttemptHistoryService::new(Arc::new(repo), bank());

        let review = service.review(stored.id()).await.unwrap();
        assert_eq!(review.questions.len(), 3);
        assert!(review.questions[0].is_correct);
        assert!(!review.questions[1].is_correct);
        assert_eq!(review.questions[2].submitted, None);
        assert!(!review.questions[2].is_correct);
        assert_eq!(review.questions[2].time_spent, Some(30));
        assert_eq!(review.total_time_secs, 45);
        assert_eq!(review.average_time_secs, 15);
        assert_eq!(review.summary.score, 1);
    }

    #[tokio::test]
    async fn unknown_attempt_is_not_found() {
        let service =
            AttemptHistoryService::new(Arc::new(InMemoryRepository::new()), bank());
        let id = AttemptId::generate();
        let err = service.review(id).await.unwrap_err();
        assert!(matches!(err, HistoryError::NotFound(missing) if missing == id));
    }

    #[test]
    fn average_is_zero_without_recorded_times() {
        let skipped = attempt(0, &[], &[]);
        let review = AttemptReview::build(&skipped, &bank());
        assert_eq!(review.average_time_secs, 0);
        assert!(review.questions.iter().all(|q| q.time_spent.is_none()));
    }
}
