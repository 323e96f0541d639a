#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod level;
pub mod model;
pub mod quiz;
pub mod sequencer;
pub mod time;

pub use error::Error;
pub use level::{level_for_xp, xp_floor_for_level, LevelProgress};
pub use quiz::{QuizError, QuizEvent, QuizResult, QuizSession, QuizState};
pub use sequencer::{LessonStatus, TrackLessons};
pub use time::Clock;
