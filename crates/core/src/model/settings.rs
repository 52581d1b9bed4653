use thiserror::Error;

/// Longest allowed per-question limit, one hour.
pub const MAX_TIME_LIMIT_SECS: u32 = 3_600;

/// Per-question limit used when nothing else is configured.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("time limit must be between 1 and {MAX_TIME_LIMIT_SECS} seconds, got {0}")]
    InvalidTimeLimit(u32),
}

/// Tunables for a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    time_limit_secs: u32,
}

impl QuizSettings {
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidTimeLimit` if the limit is zero or above
    /// [`MAX_TIME_LIMIT_SECS`].
    pub fn new(time_limit_secs: u32) -> Result<Self, SettingsError> {
        if time_limit_secs == 0 || time_limit_secs > MAX_TIME_LIMIT_SECS {
            return Err(SettingsError::InvalidTimeLimit(time_limit_secs));
        }
        Ok(Self { time_limit_secs })
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_thirty_seconds() {
        assert_eq!(QuizSettings::default().time_limit_secs(), 30);
    }

    #[test]
    fn rejects_out_of_range_limits() {
        assert_eq!(
            QuizSettings::new(0).unwrap_err(),
            SettingsError::InvalidTimeLimit(0)
        );
        assert!(QuizSettings::new(MAX_TIME_LIMIT_SECS + 1).is_err());
        assert_eq!(QuizSettings::new(1).unwrap().time_limit_secs(), 1);
        assert!(QuizSettings::new(MAX_TIME_LIMIT_SECS).is_ok());
    }
}
