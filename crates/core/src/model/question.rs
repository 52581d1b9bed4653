use std::collections::HashSet;

use thiserror::Error;

use crate::model::answer::{AnswerKind, AnswerValue};
use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id must be > 0")]
    InvalidId,

    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("choice question {id} needs at least two options")]
    TooFewOptions { id: QuestionId },

    #[error("choice question {id} has a blank option")]
    BlankOption { id: QuestionId },

    #[error("choice question {id} lists option {option:?} twice")]
    DuplicateOption { id: QuestionId, option: String },

    #[error("question {id} is {expected} but its correct answer is {found}")]
    AnswerKindMismatch {
        id: QuestionId,
        expected: AnswerKind,
        found: AnswerKind,
    },

    #[error("correct answer {answer:?} is not an option of question {id}")]
    AnswerNotAnOption { id: QuestionId, answer: String },
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// How a question is presented and answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// Pick one of the listed options; the answer is the option text.
    Choice { options: Vec<String> },
    /// Type a whole number.
    Integer,
}

impl QuestionKind {
    #[must_use]
    pub fn answer_kind(&self) -> AnswerKind {
        match self {
            QuestionKind::Choice { .. } => AnswerKind::Choice,
            QuestionKind::Integer => AnswerKind::Integer,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single immutable quiz question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    prompt: String,
    correct_answer: AnswerValue,
}

impl Question {
    /// Build and validate a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id is zero, the prompt is blank, the
    /// options are unusable, or the correct answer does not fit the kind.
    pub fn new(
        id: QuestionId,
        kind: QuestionKind,
        prompt: impl Into<String>,
        correct_answer: AnswerValue,
    ) -> Result<Self, QuestionError> {
        if id.value() == 0 {
            return Err(QuestionError::InvalidId);
        }

        let prompt = prompt.into().trim().to_owned();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }

        let expected = kind.answer_kind();
        if correct_answer.kind() != expected {
            return Err(QuestionError::AnswerKindMismatch {
                id,
                expected,
                found: correct_answer.kind(),
            });
        }

        if let QuestionKind::Choice { options } = &kind {
            validate_options(id, options)?;
            if let AnswerValue::Choice(answer) = &correct_answer {
                if !options.iter().any(|o| o == answer) {
                    return Err(QuestionError::AnswerNotAnOption {
                        id,
                        answer: answer.clone(),
                    });
                }
            }
        }

        Ok(Self {
            id,
            kind,
            prompt,
            correct_answer,
        })
    }

    /// Convenience constructor for a multiple-choice question.
    ///
    /// # Errors
    ///
    /// See [`Question::new`].
    pub fn choice<I, S>(
        id: u64,
        prompt: impl Into<String>,
        options: I,
        correct: impl Into<String>,
    ) -> Result<Self, QuestionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            QuestionId::new(id),
            QuestionKind::Choice {
                options: options.into_iter().map(Into::into).collect(),
            },
            prompt,
            AnswerValue::Choice(correct.into()),
        )
    }

    /// Convenience constructor for an integer question.
    ///
    /// # Errors
    ///
    /// See [`Question::new`].
    pub fn integer(id: u64, prompt: impl Into<String>, correct: i64) -> Result<Self, QuestionError> {
        Self::new(
            QuestionId::new(id),
            QuestionKind::Integer,
            prompt,
            AnswerValue::Integer(correct),
        )
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    #[must_use]
    pub fn answer_kind(&self) -> AnswerKind {
        self.kind.answer_kind()
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Options in display order; empty for integer questions.
    #[must_use]
    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::Choice { options } => options,
            QuestionKind::Integer => &[],
        }
    }

    #[must_use]
    pub fn correct_answer(&self) -> &AnswerValue {
        &self.correct_answer
    }

    /// Exact comparison against the correct answer.
    #[must_use]
    pub fn is_correct(&self, answer: &AnswerValue) -> bool {
        &self.correct_answer == answer
    }
}

fn validate_options(id: QuestionId, options: &[String]) -> Result<(), QuestionError> {
    if options.len() < 2 {
        return Err(QuestionError::TooFewOptions { id });
    }
    let mut seen = HashSet::with_capacity(options.len());
    for option in options {
        if option.trim().is_empty() {
            return Err(QuestionError::BlankOption { id });
        }
        if !seen.insert(option.as_str()) {
            return Err(QuestionError::DuplicateOption {
                id,
                option: option.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_choice_question() {
        let q = Question::choice(1, "Closest planet?", ["Venus", "Mercury"], "Mercury").unwrap();
        assert_eq!(q.id(), QuestionId::new(1));
        assert_eq!(q.answer_kind(), AnswerKind::Choice);
        assert_eq!(q.options(), ["Venus".to_string(), "Mercury".to_string()]);
        assert!(q.is_correct(&AnswerValue::from("Mercury")));
        assert!(!q.is_correct(&AnswerValue::from("mercury")));
    }

    #[test]
    fn integer_question_has_no_options() {
        let q = Question::integer(6, "12 + 28?", 40).unwrap();
        assert!(q.options().is_empty());
        assert!(q.is_correct(&AnswerValue::Integer(40)));
        assert!(!q.is_correct(&AnswerValue::from("40")));
    }

    #[test]
    fn rejects_zero_id_and_blank_prompt() {
        assert_eq!(
            Question::integer(0, "x", 1).unwrap_err(),
            QuestionError::InvalidId
        );
        assert!(matches!(
            Question::integer(2, "   ", 1).unwrap_err(),
            QuestionError::EmptyPrompt { .. }
        ));
    }

    #[test]
    fn rejects_bad_options() {
        assert!(matches!(
            Question::choice(1, "q", ["A"], "A").unwrap_err(),
            QuestionError::TooFewOptions { .. }
        ));
        assert!(matches!(
            Question::choice(1, "q", ["A", " "], "A").unwrap_err(),
            QuestionError::BlankOption { .. }
        ));
        assert!(matches!(
            Question::choice(1, "q", ["A", "A"], "A").unwrap_err(),
            QuestionError::DuplicateOption { .. }
        ));
        assert!(matches!(
            Question::choice(1, "q", ["A", "B"], "C").unwrap_err(),
            QuestionError::AnswerNotAnOption { .. }
        ));
    }

    #[test]
    fn rejects_answer_of_wrong_kind() {
        let err = Question::new(
            QuestionId::new(3),
            QuestionKind::Integer,
            "q",
            AnswerValue::from("40"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            QuestionError::AnswerKindMismatch {
                id: QuestionId::new(3),
                expected: AnswerKind::Integer,
                found: AnswerKind::Choice,
            }
        );
    }
}
