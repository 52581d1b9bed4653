//! Question bank input: the built-in quiz and TOML bank files.
//!
//! A bank file is a list of `[[questions]]` tables:
//!
//! ```toml
//! [[questions]]
//! id = 1
//! kind = "choice"
//! prompt = "Which planet is closest to the Sun?"
//! options = ["Venus", "Mercury"]
//! correct_answer = "Mercury"
//!
//! [[questions]]
//! id = 2
//! kind = "integer"
//! prompt = "What is 12 + 28?"
//! correct_answer = 40
//! ```

use std::path::Path;

use serde::Deserialize;

use quiz_core::model::{Question, QuestionBank};

use crate::error::BankLoadError;

const BUILTIN_BANK: &str = include_str!("../data/builtin_bank.toml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BankFile {
    questions: Vec<QuestionRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum QuestionRecord {
    Choice {
        id: u64,
        prompt: String,
        options: Vec<String>,
        correct_answer: String,
    },
    Integer {
        id: u64,
        prompt: String,
        correct_answer: i64,
    },
}

impl QuestionRecord {
    fn into_question(self) -> Result<Question, quiz_core::Error> {
        let question = match self {
            QuestionRecord::Choice {
                id,
                prompt,
                options,
                correct_answer,
            } => Question::choice(id, prompt, options, correct_answer)?,
            QuestionRecord::Integer {
                id,
                prompt,
                correct_answer,
            } => Question::integer(id, prompt, correct_answer)?,
        };
        Ok(question)
    }
}

/// Parse and validate a bank from TOML text.
///
/// # Errors
///
/// Returns `BankLoadError::Parse` for malformed TOML and
/// `BankLoadError::Invalid` if a question or the bank fails validation.
pub fn parse_bank(text: &str) -> Result<QuestionBank, BankLoadError> {
    let file: BankFile = toml::from_str(text)?;
    let questions = file
        .questions
        .into_iter()
        .map(QuestionRecord::into_question)
        .collect::<Result<Vec<_>, _>>()?;
    QuestionBank::new(questions)
        .map_err(quiz_core::Error::from)
        .map_err(BankLoadError::from)
}

/// Read a bank file from disk.
///
/// # Errors
///
/// Returns `BankLoadError::Io` if the file cannot be read, otherwise see
/// [`parse_bank`].
pub fn load_bank(path: &Path) -> Result<QuestionBank, BankLoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| BankLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bank = parse_bank(&text)?;
    tracing::info!(path = %path.display(), questions = bank.len(), "question bank loaded");
    Ok(bank)
}

/// The ten-question default quiz.
///
/// # Errors
///
/// Only fails if the embedded bank is itself invalid.
pub fn builtin_bank() -> Result<QuestionBank, BankLoadError> {
    parse_bank(BUILTIN_BANK)
}
