use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{AnswerValue, QuestionId};
use crate::scorer::{AnswerMap, TimeSpentMap};

/// Coarse lifecycle of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    InProgress { index: usize },
    Complete,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::NotStarted => f.write_str("not started"),
            SessionPhase::InProgress { index } => write!(f, "in progress at question #{}", index + 1),
            SessionPhase::Complete => f.write_str("complete"),
        }
    }
}

/// Mutable state of one quiz run.
///
/// A plain serializable value: only the session state machine writes to it,
/// and presentation receives clones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    current_index: usize,
    answers: AnswerMap,
    time_spent: TimeSpentMap,
    complete: bool,
    started_at: Option<DateTime<Utc>>,
}

impl SessionState {
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn time_spent(&self) -> &TimeSpentMap {
        &self.time_spent
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match (self.started_at, self.complete) {
            (None, _) => SessionPhase::NotStarted,
            (Some(_), true) => SessionPhase::Complete,
            (Some(_), false) => SessionPhase::InProgress {
                index: self.current_index,
            },
        }
    }

    /// An answer or an expiry has been recorded for this question.
    #[must_use]
    pub fn is_locked(&self, id: QuestionId) -> bool {
        self.answers.contains_key(&id) || self.time_spent.contains_key(&id)
    }

    #[must_use]
    pub fn answer_for(&self, id: QuestionId) -> Option<&AnswerValue> {
        self.answers.get(&id)
    }

    pub(crate) fn begin(&mut self, now: DateTime<Utc>) {
        *self = Self {
            started_at: Some(now),
            ..Self::default()
        };
    }

    pub(crate) fn record_answer(&mut self, id: QuestionId, value: AnswerValue, secs: u32) {
        self.answers.insert(id, value);
        self.time_spent.insert(id, secs);
    }

    pub(crate) fn record_time(&mut self, id: QuestionId, secs: u32) {
        self.time_spent.insert(id, secs);
    }

    pub(crate) fn step_forward(&mut self) {
        self.current_index += 1;
    }

    pub(crate) fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn phase_follows_fields() {
        let mut state = SessionState::default();
        assert_eq!(state.phase(), SessionPhase::NotStarted);

        state.begin(fixed_now());
        assert_eq!(state.phase(), SessionPhase::InProgress { index: 0 });

        state.step_forward();
        assert_eq!(state.phase(), SessionPhase::InProgress { index: 1 });

        state.mark_complete();
        assert_eq!(state.phase(), SessionPhase::Complete);

        state.reset();
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn expiry_locks_without_answer() {
        let mut state = SessionState::default();
        state.begin(fixed_now());
        state.record_time(QuestionId::new(2), 30);
        assert!(state.is_locked(QuestionId::new(2)));
        assert!(state.answer_for(QuestionId::new(2)).is_none());
    }

    #[test]
    fn snapshot_serializes_with_camel_case_keys() {
        let mut state = SessionState::default();
        state.begin(fixed_now());
        state.record_answer(QuestionId::new(1), AnswerValue::Integer(40), 5);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["currentIndex"], 0);
        assert_eq!(json["answers"]["1"], 40);
        assert_eq!(json["timeSpent"]["1"], 5);
        assert_eq!(json["complete"], false);

        let back: SessionState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
