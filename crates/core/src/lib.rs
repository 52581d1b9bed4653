#![forbid(unsafe_code)]

pub mod countdown;
pub mod error;
pub mod model;
pub mod quiz;
pub mod scorer;
pub mod time;

pub use countdown::{Countdown, CountdownState, CountdownStep};
pub use error::Error;
pub use quiz::{Advance, QuizSession, Submission, SubmitOutcome, TransitionError};
pub use scorer::{AnswerMap, TimeSpentMap, score};
pub use time::Clock;
