use std::time::Duration;

use quiz_core::model::{Question, QuestionId, SessionPhase};
use quiz_core::{CountdownState, Submission, SubmitOutcome, TransitionError};
use tokio::sync::mpsc;

use super::service::{CompletedAttempt, QuizSessionService, SessionStep};
use crate::error::SessionError;
use crate::timer::{CountdownTimer, TICK_PERIOD};

/// Input from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizInput {
    /// Raw answer text for the open question.
    Submit(String),
    /// Leave the open question, answered or not.
    Advance,
    /// Start over after completion.
    Retry,
    Quit,
}

/// What the runner reports back while a quiz is live.
#[derive(Debug)]
pub enum QuizEvent {
    QuestionShown {
        index: usize,
        total: usize,
        question: Question,
        time_limit: u32,
    },
    Tick {
        index: usize,
        remaining: u32,
    },
    AnswerRecorded(Submission),
    /// Input did not parse; the question is still open.
    InputIgnored {
        index: usize,
    },
    Rejected(SessionError),
    TimeUp {
        question_id: QuestionId,
    },
    Completed(CompletedAttempt),
    Reset,
}

#[derive(Debug, Clone, Copy)]
enum TimerKind {
    Tick(u32),
    Expired,
}

/// Timer callback tagged with the arm cycle that produced it.
#[derive(Debug, Clone, Copy)]
struct TimerSignal {
    generation: u64,
    kind: TimerKind,
}

/// Drives a [`QuizSessionService`] from user input and a per-question
/// countdown.
///
/// User input and timer callbacks are interleaved on one task. A successful
/// submit stops the countdown at once and bumps the arm generation, so a tick
/// or expiry already in flight for that question is dropped.
pub struct QuizRunner {
    service: QuizSessionService,
    tick_period: Duration,
    auto_advance: bool,
}

impl QuizRunner {
    #[must_use]
    pub fn new(service: QuizSessionService) -> Self {
        Self {
            service,
            tick_period: TICK_PERIOD,
            auto_advance: true,
        }
    }

    /// Move on as soon as an answer is locked. On by default.
    #[must_use]
    pub fn with_auto_advance(mut self, auto_advance: bool) -> Self {
        self.auto_advance = auto_advance;
        self
    }

    #[must_use]
    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    /// Start the quiz and run it until `Quit` or until `inputs` closes.
    ///
    /// Leaving early discards the session without saving anything. The
    /// service is handed back so callers can inspect the final state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the service was already started.
    pub async fn run<F>(
        self,
        mut inputs: mpsc::Receiver<QuizInput>,
        emit: F,
    ) -> Result<QuizSessionService, SessionError>
    where
        F: FnMut(QuizEvent),
    {
        let (signals_tx, mut signals) = mpsc::unbounded_channel();
        let mut live = Live {
            service: self.service,
            timer: CountdownTimer::with_period(self.tick_period),
            signals: signals_tx,
            generation: 0,
            auto_advance: self.auto_advance,
            emit,
        };

        live.begin()?;

        loop {
            tokio::select! {
                biased;
                Some(signal) = signals.recv() => live.on_timer(signal).await,
                input = inputs.recv() => match input {
                    Some(QuizInput::Quit) | None => break,
                    Some(input) => live.on_input(input).await,
                },
            }
        }

        live.disarm();
        if !live.service.is_complete() {
            tracing::info!(phase = %live.service.phase(), "quiz abandoned");
        }
        Ok(live.service)
    }
}

struct Live<F> {
    service: QuizSessionService,
    timer: CountdownTimer,
    signals: mpsc::UnboundedSender<TimerSignal>,
    generation: u64,
    auto_advance: bool,
    emit: F,
}

impl<F> Live<F>
where
    F: FnMut(QuizEvent),
{
    fn begin(&mut self) -> Result<(), SessionError> {
        self.service.start()?;
        self.show_current();
        Ok(())
    }

    fn current_index(&self) -> Option<usize> {
        match self.service.phase() {
            SessionPhase::InProgress { index } => Some(index),
            _ => None,
        }
    }

    fn show_current(&mut self) {
        let (Some(index), Some(question)) =
            (self.current_index(), self.service.current_question().cloned())
        else {
            return;
        };
        let time_limit = self.service.time_limit();
        (self.emit)(QuizEvent::QuestionShown {
            index,
            total: self.service.bank().len(),
            question,
            time_limit,
        });
        self.arm(time_limit);
    }

    fn arm(&mut self, limit: u32) {
        self.generation += 1;
        let generation = self.generation;
        let tick_tx = self.signals.clone();
        let expire_tx = self.signals.clone();
        self.timer.start(
            limit,
            move |remaining| {
                let _ = tick_tx.send(TimerSignal {
                    generation,
                    kind: TimerKind::Tick(remaining),
                });
            },
            move || {
                let _ = expire_tx.send(TimerSignal {
                    generation,
                    kind: TimerKind::Expired,
                });
            },
        );
    }

    fn disarm(&mut self) {
        self.timer.stop();
        self.generation += 1;
    }

    async fn on_timer(&mut self, signal: TimerSignal) {
        if signal.generation != self.generation {
            tracing::debug!(generation = signal.generation, "stale timer signal dropped");
            return;
        }
        let Some(index) = self.current_index() else {
            return;
        };
        match signal.kind {
            TimerKind::Tick(remaining) => (self.emit)(QuizEvent::Tick { index, remaining }),
            TimerKind::Expired => self.expire_current().await,
        }
    }

    async fn expire_current(&mut self) {
        self.disarm();
        if let Some(question) = self.service.current_question() {
            let question_id = question.id();
            (self.emit)(QuizEvent::TimeUp { question_id });
        }
        let step = self.service.time_expire().await;
        self.settle(step);
    }

    /// Seconds left on the open question, or `None` if its countdown already
    /// hit zero. An expiry that has fired but not been handled yet is handled
    /// here, so it always beats the input being processed.
    async fn remaining_or_expire(&mut self) -> Option<u32> {
        match self.timer.status() {
            Some((CountdownState::Expired, _)) if self.current_index().is_some() => {
                tracing::debug!("input arrived after expiry");
                self.expire_current().await;
                None
            }
            Some((_, remaining)) => Some(remaining),
            None => Some(self.service.time_limit()),
        }
    }

    async fn on_input(&mut self, input: QuizInput) {
        match input {
            QuizInput::Submit(raw) => self.submit(&raw).await,
            QuizInput::Advance => {
                let Some(remaining) = self.remaining_or_expire().await else {
                    return;
                };
                let step = self.service.skip(remaining).await;
                if step.is_ok() {
                    self.disarm();
                }
                self.settle(step);
            }
            QuizInput::Retry => match self.service.retry() {
                Ok(()) => {
                    (self.emit)(QuizEvent::Reset);
                    if let Err(err) = self.begin() {
                        (self.emit)(QuizEvent::Rejected(err));
                    }
                }
                Err(err) => (self.emit)(QuizEvent::Rejected(err)),
            },
            QuizInput::Quit => {}
        }
    }

    async fn submit(&mut self, raw: &str) {
        let question_id = self.service.current_question().map(Question::id);
        let Some(remaining) = self.remaining_or_expire().await else {
            if let Some(question_id) = question_id {
                let err = SessionError::from(TransitionError::AnswerLocked { question_id });
                (self.emit)(QuizEvent::Rejected(err));
            }
            return;
        };
        match self.service.submit(raw, remaining) {
            Ok(SubmitOutcome::Recorded(submission)) => {
                self.disarm();
                (self.emit)(QuizEvent::AnswerRecorded(submission));
                if self.auto_advance {
                    let step = self.service.advance().await;
                    self.settle(step);
                }
            }
            Ok(SubmitOutcome::Ignored) => {
                if let Some(index) = self.current_index() {
                    (self.emit)(QuizEvent::InputIgnored { index });
                }
            }
            Err(err) => (self.emit)(QuizEvent::Rejected(err)),
        }
    }

    fn settle(&mut self, step: Result<SessionStep, SessionError>) {
        match step {
            Ok(SessionStep::Next { .. }) => self.show_current(),
            Ok(SessionStep::Completed(completed)) => {
                self.disarm();
                (self.emit)(QuizEvent::Completed(completed));
            }
            Err(err) => (self.emit)(QuizEvent::Rejected(err)),
        }
    }
}
