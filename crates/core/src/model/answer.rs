use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminates how a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    Choice,
    Integer,
}

impl AnswerKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerKind::Choice => "choice",
            AnswerKind::Integer => "integer",
        }
    }
}

impl fmt::Display for AnswerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted or expected answer.
///
/// Serialized untagged, so a persisted map reads `{"1": 40, "2": "B"}`.
/// Equality is exact: `Choice("40")` never equals `Integer(40)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Integer(i64),
    Choice(String),
}

impl AnswerValue {
    #[must_use]
    pub fn kind(&self) -> AnswerKind {
        match self {
            AnswerValue::Integer(_) => AnswerKind::Integer,
            AnswerValue::Choice(_) => AnswerKind::Choice,
        }
    }

    /// Interpret raw user input for a question of the given kind.
    ///
    /// Integer input is trimmed and parsed as `i64`; anything that does not
    /// parse yields `None`. Choice input is taken verbatim.
    #[must_use]
    pub fn parse_for(kind: AnswerKind, raw: &str) -> Option<Self> {
        match kind {
            AnswerKind::Integer => raw.trim().parse::<i64>().ok().map(AnswerValue::Integer),
            AnswerKind::Choice => Some(AnswerValue::Choice(raw.to_owned())),
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Integer(n) => write!(f, "{n}"),
            AnswerValue::Choice(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AnswerValue {
    fn from(value: i64) -> Self {
        AnswerValue::Integer(value)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Choice(value.to_owned())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Choice(value)
    }
}
