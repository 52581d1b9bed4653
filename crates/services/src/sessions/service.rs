use std::fmt;
use std::sync::Arc;

use quiz_core::model::{
    AnswerValue, Attempt, Question, QuestionBank, QuizSettings, SessionPhase, SessionState,
};
use quiz_core::{Advance, QuizSession, Submission, SubmitOutcome};
use storage::repository::AttemptRepository;

use super::progress::SessionProgress;
use crate::Clock;
use crate::error::SessionError;

//
// ─── COMPLETION ────────────────────────────────────────────────────────────────
//

/// Whether the completed attempt reached the attempt store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceStatus {
    Saved,
    /// The store rejected the write; the in-memory result is still valid.
    Failed(String),
}

impl PersistenceStatus {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistenceStatus::Saved)
    }
}

/// A finished session together with its persistence outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedAttempt {
    pub attempt: Attempt,
    pub persistence: PersistenceStatus,
}

/// Result of leaving the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStep {
    Next { index: usize },
    Completed(CompletedAttempt),
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Quiz session backed by an attempt store.
///
/// Wraps the pure [`QuizSession`] with a clock for the start stamp and a
/// single best-effort `save` when the last question is left.
pub struct QuizSessionService {
    clock: Clock,
    session: QuizSession,
    attempts: Arc<dyn AttemptRepository>,
    last_completed: Option<CompletedAttempt>,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<QuestionBank>,
        settings: QuizSettings,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            session: QuizSession::new(bank, settings),
            attempts,
            last_completed: None,
        }
    }

    #[must_use]
    pub fn time_limit(&self) -> u32 {
        self.session.time_limit()
    }

    #[must_use]
    pub fn bank(&self) -> &Arc<QuestionBank> {
        self.session.bank()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.is_complete()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.session.snapshot()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    /// Outcome of the most recent completion, kept until `retry`.
    #[must_use]
    pub fn last_completed(&self) -> Option<&CompletedAttempt> {
        self.last_completed.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::of(self.session.state(), self.session.bank().len())
    }

    /// Begin the quiz at the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` if the session already started.
    pub fn start(&mut self) -> Result<Question, SessionError> {
        let now = self.clock.now();
        let question = self.session.start(now).map_err(reject)?.clone();
        tracing::info!(
            started_at = %now,
            questions = self.session.bank().len(),
            time_limit = self.session.time_limit(),
            "quiz session started"
        );
        Ok(question)
    }

    /// Submit raw input for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` if the session is not in progress or
    /// the question is locked. Unparseable integers come back as
    /// `SubmitOutcome::Ignored`.
    pub fn submit(&mut self, raw: &str, remaining: u32) -> Result<SubmitOutcome, SessionError> {
        let outcome = self.session.submit_raw(raw, remaining).map_err(reject)?;
        match &outcome {
            SubmitOutcome::Recorded(sub) => log_submission(sub),
            SubmitOutcome::Ignored => {
                tracing::debug!(input = raw, "malformed answer treated as no answer");
            }
        }
        Ok(outcome)
    }

    /// Submit an already-typed answer for the current question.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::submit_answer`].
    pub fn submit_answer(
        &mut self,
        value: AnswerValue,
        remaining: u32,
    ) -> Result<Submission, SessionError> {
        let sub = self
            .session
            .submit_answer(value, remaining)
            .map_err(reject)?;
        log_submission(&sub);
        Ok(sub)
    }

    /// Leave the current question; completing the session persists the attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` outside `InProgress`. Persistence
    /// failures are reported in [`CompletedAttempt::persistence`], never here.
    pub async fn advance(&mut self) -> Result<SessionStep, SessionError> {
        let advance = self.session.advance().map_err(reject)?;
        Ok(self.settle(advance).await)
    }

    /// Leave the current question on request, charging the seconds used if
    /// it was not answered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` outside `InProgress`.
    pub async fn skip(&mut self, remaining: u32) -> Result<SessionStep, SessionError> {
        let advance = self.session.skip(remaining).map_err(reject)?;
        Ok(self.settle(advance).await)
    }

    /// The current question's time ran out.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` outside `InProgress`.
    pub async fn time_expire(&mut self) -> Result<SessionStep, SessionError> {
        let question_id = self.current_question().map(Question::id);
        let advance = self.session.time_expire().map_err(reject)?;
        if let Some(question_id) = question_id {
            tracing::debug!(%question_id, "question timed out");
        }
        Ok(self.settle(advance).await)
    }

    /// Return a completed session to `NotStarted`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Transition` unless the session is complete.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        self.session.retry().map_err(reject)?;
        self.last_completed = None;
        tracing::debug!("quiz session reset");
        Ok(())
    }

    async fn settle(&mut self, advance: Advance) -> SessionStep {
        match advance {
            Advance::Next { index } => SessionStep::Next { index },
            Advance::Completed(attempt) => {
                let completed = self.persist(attempt).await;
                self.last_completed = Some(completed.clone());
                SessionStep::Completed(completed)
            }
        }
    }

    async fn persist(&self, attempt: Attempt) -> CompletedAttempt {
        let persistence = match self.attempts.save_attempt(&attempt).await {
            Ok(()) => {
                tracing::info!(
                    attempt_id = %attempt.id(),
                    score = attempt.score(),
                    total = attempt.total_questions(),
                    "quiz attempt saved"
                );
                PersistenceStatus::Saved
            }
            Err(err) => {
                tracing::warn!(
                    attempt_id = %attempt.id(),
                    error = %err,
                    "failed to save quiz attempt"
                );
                PersistenceStatus::Failed(err.to_string())
            }
        };
        CompletedAttempt {
            attempt,
            persistence,
        }
    }
}

fn reject(err: quiz_core::TransitionError) -> SessionError {
    tracing::warn!(error = %err, "session transition rejected");
    SessionError::from(err)
}

fn log_submission(sub: &Submission) {
    tracing::debug!(
        question_id = %sub.question_id,
        time_spent = sub.time_spent,
        "answer locked"
    );
}

impl fmt::Debug for QuizSessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSessionService")
            .field("clock", &self.clock)
            .field("phase", &self.session.phase())
            .field("questions", &self.session.bank().len())
            .field("time_limit", &self.session.time_limit())
            .field("last_completed", &self.last_completed.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_core::TransitionError;
    use quiz_core::model::QuestionId;
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::repository::{InMemoryRepository, StorageError};

    struct FailingRepository;

    #[async_trait]
    impl AttemptRepository for FailingRepository {
        async fn save_attempt(&self, _attempt: &Attempt) -> Result<(), StorageError> {
            Err(StorageError::Connection("store offline".into()))
        }

        async fn list_attempts(&self) -> Result<Vec<Attempt>, StorageError> {
            Err(StorageError::Connection("store offline".into()))
        }
    }

    fn bank() -> Arc<QuestionBank> {
        Arc::new(
            QuestionBank::new(vec![
                Question::integer(1, "12 + 28?", 40).unwrap(),
                Question::choice(2, "Pick B", ["A", "B"], "B").unwrap(),
            ])
            .unwrap(),
        )
    }

    fn service(attempts: Arc<dyn AttemptRepository>) -> QuizSessionService {
        QuizSessionService::new(
            fixed_clock(),
            bank(),
            QuizSettings::new(30).unwrap(),
            attempts,
        )
    }

    fn completed(step: SessionStep) -> CompletedAttempt {
        match step {
            SessionStep::Completed(done) => done,
            SessionStep::Next { index } => panic!("expected completion, got next {index}"),
        }
    }

    #[tokio::test]
    async fn completion_saves_exactly_one_attempt() {
        let repo = InMemoryRepository::new();
        let mut svc = service(Arc::new(repo.clone()));

        let first = svc.start().unwrap();
        assert_eq!(first.id(), QuestionId::new(1));
        svc.submit("40", 25).unwrap();
        assert_eq!(svc.advance().await.unwrap(), SessionStep::Next { index: 1 });
        let done = completed(svc.time_expire().await.unwrap());

        assert_eq!(done.persistence, PersistenceStatus::Saved);
        assert_eq!(done.attempt.score(), 1);
        assert_eq!(done.attempt.date(), fixed_now());

        let stored = repo.list_attempts().await.unwrap();
        assert_eq!(stored, vec![done.attempt.clone()]);
        assert_eq!(svc.last_completed(), Some(&done));

        assert!(matches!(
            svc.advance().await.unwrap_err(),
            SessionError::Transition(TransitionError::NotInProgress { .. })
        ));
        assert_eq!(repo.list_attempts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn persistence_failure_still_completes() {
        let mut svc = service(Arc::new(FailingRepository));
        svc.start().unwrap();
        svc.submit("40", 29).unwrap();
        svc.advance().await.unwrap();
        svc.submit("B", 20).unwrap();
        let done = completed(svc.advance().await.unwrap());

        assert!(matches!(done.persistence, PersistenceStatus::Failed(ref msg) if msg.contains("store offline")));
        assert!(!done.persistence.is_saved());
        assert!(svc.is_complete());
        assert_eq!(done.attempt.score(), 2);
        assert_eq!(svc.phase(), SessionPhase::Complete);
    }

    #[tokio::test]
    async fn retry_clears_session_but_not_store() {
        let repo = InMemoryRepository::new();
        let mut svc = service(Arc::new(repo.clone()));
        svc.start().unwrap();
        svc.advance().await.unwrap();
        svc.advance().await.unwrap();

        let before = repo.list_attempts().await.unwrap();
        svc.retry().unwrap();

        let state = svc.snapshot();
        assert_eq!(state.current_index(), 0);
        assert!(state.answers().is_empty());
        assert!(!state.is_complete());
        assert!(svc.last_completed().is_none());
        assert_eq!(repo.list_attempts().await.unwrap(), before);
    }

    #[tokio::test]
    async fn rejected_submission_leaves_first_answer() {
        let mut svc = service(Arc::new(InMemoryRepository::new()));
        svc.start().unwrap();
        svc.submit_answer(AnswerValue::Integer(40), 20).unwrap();
        let err = svc.submit_answer(AnswerValue::Integer(7), 10).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transition(TransitionError::AnswerLocked { .. })
        ));
        assert_eq!(
            svc.snapshot().answer_for(QuestionId::new(1)),
            Some(&AnswerValue::Integer(40))
        );
    }

    #[tokio::test]
    async fn skipped_question_counts_toward_total_time() {
        let repo = InMemoryRepository::new();
        let mut svc = service(Arc::new(repo.clone()));
        svc.start().unwrap();
        assert_eq!(svc.skip(18).await.unwrap(), SessionStep::Next { index: 1 });
        let done = completed(svc.time_expire().await.unwrap());

        assert_eq!(done.attempt.time_spent().get(&QuestionId::new(1)), Some(&12));
        assert_eq!(done.attempt.total_time_secs(), 42);
        assert!(done.attempt.answers().is_empty());
    }

    #[tokio::test]
    async fn progress_tracks_position() {
        let mut svc = service(Arc::new(InMemoryRepository::new()));
        svc.start().unwrap();
        svc.submit("40", 10).unwrap();
        let progress = svc.progress();
        assert_eq!(progress.total, 2);
        assert_eq!(progress.current, Some(1));
        assert_eq!(progress.answered, 1);
        assert!(!progress.is_complete);
    }
}
