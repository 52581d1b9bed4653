use quiz_core::model::{SessionPhase, SessionState};

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    /// 1-based position of the open question, `None` before start and after completion.
    pub current: Option<usize>,
    pub answered: usize,
    /// Questions not yet left, including the open one.
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn of(state: &SessionState, total: usize) -> Self {
        let (current, remaining) = match state.phase() {
            SessionPhase::NotStarted => (None, total),
            SessionPhase::InProgress { index } => (Some(index + 1), total.saturating_sub(index)),
            SessionPhase::Complete => (None, 0),
        };
        Self {
            total,
            current,
            answered: state.answers().len(),
            remaining,
            is_complete: state.is_complete(),
        }
    }
}
