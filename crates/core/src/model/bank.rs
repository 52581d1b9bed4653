use std::collections::HashMap;

use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank is empty")]
    Empty,

    #[error("question id {0} appears more than once")]
    DuplicateId(QuestionId),
}

/// Ordered, immutable set of questions for one quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
    positions: HashMap<QuestionId, usize>,
}

impl QuestionBank {
    /// Validate the ordered question list.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Empty` for an empty list and
    /// `BankError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }

        let mut positions = HashMap::with_capacity(questions.len());
        for (index, question) in questions.iter().enumerate() {
            if positions.insert(question.id(), index).is_some() {
                return Err(BankError::DuplicateId(question.id()));
            }
        }

        Ok(Self {
            questions,
            positions,
        })
    }

    /// Number of questions; never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn find(&self, id: QuestionId) -> Option<&Question> {
        self.positions.get(&id).map(|&index| &self.questions[index])
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

impl<'a> IntoIterator for &'a QuestionBank {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_order_and_indexes_by_id() {
        let bank = QuestionBank::new(vec![
            Question::integer(10, "a", 1).unwrap(),
            Question::integer(3, "b", 2).unwrap(),
        ])
        .unwrap();

        assert_eq!(bank.len(), 2);
        assert_eq!(bank.get(0).unwrap().id(), QuestionId::new(10));
        assert_eq!(bank.find(QuestionId::new(3)).unwrap().prompt(), "b");
        assert!(bank.find(QuestionId::new(4)).is_none());
        assert!(bank.get(2).is_none());
    }

    #[test]
    fn rejects_empty_bank() {
        assert_eq!(QuestionBank::new(Vec::new()).unwrap_err(), BankError::Empty);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = QuestionBank::new(vec![
            Question::integer(1, "a", 1).unwrap(),
            Question::integer(1, "b", 2).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(err, BankError::DuplicateId(QuestionId::new(1)));
    }
}
