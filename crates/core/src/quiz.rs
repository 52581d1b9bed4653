use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    AnswerKind, AnswerValue, Attempt, AttemptError, AttemptId, Question, QuestionBank,
    QuestionId, QuizSettings, SessionPhase, SessionState,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// A transition that is not allowed in the current phase.
///
/// Rejections never modify the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("session is not in progress ({phase})")]
    NotInProgress { phase: SessionPhase },

    #[error("session already started")]
    AlreadyStarted,

    #[error("session is not complete ({phase})")]
    NotComplete { phase: SessionPhase },

    #[error("question {question_id} is already locked")]
    AnswerLocked { question_id: QuestionId },

    #[error("question {question_id} expects a {expected} answer, got {found}")]
    KindMismatch {
        question_id: QuestionId,
        expected: AnswerKind,
        found: AnswerKind,
    },

    #[error("snapshot does not fit this question bank: {0}")]
    InvalidSnapshot(String),

    #[error(transparent)]
    Attempt(#[from] AttemptError),
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// An answer that was accepted and locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub question_id: QuestionId,
    pub value: AnswerValue,
    pub time_spent: u32,
}

/// Result of submitting raw user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Recorded(Submission),
    /// Input did not parse for the question's kind; treated as no answer and
    /// the question stays open.
    Ignored,
}

/// Result of moving past the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Completed(Attempt),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine for one run through a question bank.
///
/// `NotStarted -> InProgress(index) -> Complete`, and back to `NotStarted`
/// via [`QuizSession::retry`]. The session performs no I/O and reads no
/// clock; timestamps and the remaining seconds are passed in.
#[derive(Debug, Clone)]
pub struct QuizSession {
    bank: Arc<QuestionBank>,
    time_limit: u32,
    state: SessionState,
}

impl QuizSession {
    #[must_use]
    pub fn new(bank: Arc<QuestionBank>, settings: QuizSettings) -> Self {
        Self {
            bank,
            time_limit: settings.time_limit_secs(),
            state: SessionState::default(),
        }
    }

    /// Rebuild a session from a previously taken snapshot.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::InvalidSnapshot` if the snapshot references
    /// questions outside `bank` or an index past its end.
    pub fn resume(
        bank: Arc<QuestionBank>,
        settings: QuizSettings,
        state: SessionState,
    ) -> Result<Self, TransitionError> {
        if state.current_index() >= bank.len() {
            return Err(TransitionError::InvalidSnapshot(format!(
                "index {} out of range for {} questions",
                state.current_index(),
                bank.len()
            )));
        }
        let unknown = state
            .answers()
            .keys()
            .chain(state.time_spent().keys())
            .find(|id| !bank.contains(**id));
        if let Some(id) = unknown {
            return Err(TransitionError::InvalidSnapshot(format!(
                "unknown question id {id}"
            )));
        }

        Ok(Self {
            bank,
            time_limit: settings.time_limit_secs(),
            state,
        })
    }

    #[must_use]
    pub fn bank(&self) -> &Arc<QuestionBank> {
        &self.bank
    }

    #[must_use]
    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Owned copy of the current state for presentation.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// The live question, if the session is in progress.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase() {
            SessionPhase::InProgress { index } => self.bank.get(index),
            _ => None,
        }
    }

    /// `NotStarted -> InProgress(0)`.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::AlreadyStarted` unless the session is fresh.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<&Question, TransitionError> {
        if self.phase() != SessionPhase::NotStarted {
            return Err(TransitionError::AlreadyStarted);
        }
        self.state.begin(now);
        self.live_question()
    }

    /// Lock `value` as the answer to the current question.
    ///
    /// Time spent is `limit - remaining`; a `remaining` above the limit is
    /// clamped. Does not advance.
    ///
    /// # Errors
    ///
    /// Returns `NotInProgress`, `AnswerLocked` if the question was already
    /// answered or expired, or `KindMismatch` if the value does not fit.
    pub fn submit_answer(
        &mut self,
        value: AnswerValue,
        remaining: u32,
    ) -> Result<Submission, TransitionError> {
        let (question_id, expected) = self.open_question()?;
        if value.kind() != expected {
            return Err(TransitionError::KindMismatch {
                question_id,
                expected,
                found: value.kind(),
            });
        }

        let time_spent = self.time_limit - remaining.min(self.time_limit);
        self.state
            .record_answer(question_id, value.clone(), time_spent);

        Ok(Submission {
            question_id,
            value,
            time_spent,
        })
    }

    /// Parse raw input against the current question's kind and submit it.
    ///
    /// # Errors
    ///
    /// Same as [`QuizSession::submit_answer`]; a malformed integer is not an
    /// error but [`SubmitOutcome::Ignored`].
    pub fn submit_raw(
        &mut self,
        raw: &str,
        remaining: u32,
    ) -> Result<SubmitOutcome, TransitionError> {
        let (_, kind) = self.open_question()?;
        match AnswerValue::parse_for(kind, raw) {
            Some(value) => self
                .submit_answer(value, remaining)
                .map(SubmitOutcome::Recorded),
            None => Ok(SubmitOutcome::Ignored),
        }
    }

    /// Move past the current question, completing the session after the last.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::NotInProgress` outside `InProgress`.
    pub fn advance(&mut self) -> Result<Advance, TransitionError> {
        let index = self.in_progress_index()?;

        if index + 1 < self.bank.len() {
            self.state.step_forward();
            return Ok(Advance::Next { index: index + 1 });
        }

        let date = self
            .state
            .started_at()
            .ok_or(TransitionError::NotInProgress {
                phase: self.phase(),
            })?;
        let attempt = Attempt::from_session(
            AttemptId::generate(),
            date,
            &self.bank,
            self.state.answers().clone(),
            self.state.time_spent().clone(),
        )?;
        self.state.mark_complete();
        Ok(Advance::Completed(attempt))
    }

    /// Leave the current question on request.
    ///
    /// An unanswered question is charged the seconds used so far
    /// (`limit - remaining`) and left without an answer; an answered one keeps
    /// its recorded time. Then the session advances.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::NotInProgress` outside `InProgress`.
    pub fn skip(&mut self, remaining: u32) -> Result<Advance, TransitionError> {
        let index = self.in_progress_index()?;
        let question_id = self.question_at(index)?.id();
        if !self.state.is_locked(question_id) {
            let used = self.time_limit - remaining.min(self.time_limit);
            self.state.record_time(question_id, used);
        }
        self.advance()
    }

    /// The current question ran out of time.
    ///
    /// An unanswered question is charged the full limit and left without an
    /// answer; then the session advances.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::NotInProgress` outside `InProgress`.
    pub fn time_expire(&mut self) -> Result<Advance, TransitionError> {
        let index = self.in_progress_index()?;
        let question_id = self.question_at(index)?.id();
        if !self.state.is_locked(question_id) {
            self.state.record_time(question_id, self.time_limit);
        }
        self.advance()
    }

    /// `Complete -> NotStarted`, discarding all session fields.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::NotComplete` unless the session is complete.
    pub fn retry(&mut self) -> Result<(), TransitionError> {
        if self.phase() != SessionPhase::Complete {
            return Err(TransitionError::NotComplete {
                phase: self.phase(),
            });
        }
        self.state.reset();
        Ok(())
    }

    fn in_progress_index(&self) -> Result<usize, TransitionError> {
        match self.phase() {
            SessionPhase::InProgress { index } => Ok(index),
            phase => Err(TransitionError::NotInProgress { phase }),
        }
    }

    fn question_at(&self, index: usize) -> Result<&Question, TransitionError> {
        self.bank.get(index).ok_or_else(|| {
            TransitionError::InvalidSnapshot(format!("index {index} out of range"))
        })
    }

    fn live_question(&self) -> Result<&Question, TransitionError> {
        let index = self.in_progress_index()?;
        self.question_at(index)
    }

    fn open_question(&self) -> Result<(QuestionId, AnswerKind), TransitionError> {
        let question = self.live_question()?;
        let question_id = question.id();
        if self.state.is_locked(question_id) {
            return Err(TransitionError::AnswerLocked { question_id });
        }
        Ok((question_id, question.answer_kind()))
    }
}
