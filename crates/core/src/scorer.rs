use std::collections::BTreeMap;

use crate::model::{AnswerValue, QuestionBank, QuestionId};

/// Answers keyed by question, as captured during a session.
pub type AnswerMap = BTreeMap<QuestionId, AnswerValue>;

/// Seconds spent per question.
pub type TimeSpentMap = BTreeMap<QuestionId, u32>;

/// Count the questions whose submitted answer exactly equals the correct one.
///
/// Questions without an answer score nothing. Answers for ids outside the
/// bank are ignored, so the result never exceeds `bank.len()`.
#[must_use]
pub fn score(answers: &AnswerMap, bank: &QuestionBank) -> u32 {
    let correct = bank
        .iter()
        .filter(|q| answers.get(&q.id()).is_some_and(|a| q.is_correct(a)))
        .count();
    u32::try_from(correct).unwrap_or(u32::MAX)
}
