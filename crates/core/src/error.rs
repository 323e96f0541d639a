use thiserror::Error;

use crate::model::{LessonError, NotificationError, ProgressError, QuestionError, TrackError};
use crate::quiz::QuizError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}
