//! Pure per-question countdown.
//!
//! The async driver lives in the services crate; this type only does the
//! arithmetic so the expiry rules can be tested without a runtime.

/// Lifecycle of one armed countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Running,
    Stopped,
    Expired,
}

/// Result of a single one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// A second elapsed and time remains.
    Tick { remaining: u32 },
    /// The last second elapsed. Produced exactly once per countdown.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    limit: u32,
    remaining: u32,
    state: CountdownState,
}

impl Countdown {
    /// Arm a countdown for `limit` seconds.
    ///
    /// A zero limit is already expired and never produces a step.
    #[must_use]
    pub fn armed(limit: u32) -> Self {
        let state = if limit == 0 {
            CountdownState::Expired
        } else {
            CountdownState::Running
        };
        Self {
            limit,
            remaining: limit,
            state,
        }
    }

    /// Advance by one second.
    ///
    /// Returns `None` once the countdown is stopped or expired.
    pub fn tick(&mut self) -> Option<CountdownStep> {
        if self.state != CountdownState::Running {
            return None;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = CountdownState::Expired;
            Some(CountdownStep::Expired)
        } else {
            Some(CountdownStep::Tick {
                remaining: self.remaining,
            })
        }
    }

    /// Cancel future ticks. No-op unless running.
    pub fn stop(&mut self) {
        if self.state == CountdownState::Running {
            self.state = CountdownState::Stopped;
        }
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn elapsed(&self) -> u32 {
        self.limit - self.remaining
    }

    #[must_use]
    pub fn state(&self) -> CountdownState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }
}
