//! Shared error types for the services crate.

use thiserror::Error;

use progression_core::QuizError;
use progression_core::model::{LessonError, LessonId, NotificationError, Track};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the progression engine and the services it drives.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Lessons or progress could not be read. Nothing is shown as playable.
    #[error("failed to load learning data")]
    LoadFailure(#[source] StorageError),
    /// The progress commit failed. The quiz result is kept for `retry_commit`.
    #[error("failed to save progress")]
    SaveFailure(#[source] StorageError),
    #[error("lesson {0} not found")]
    LessonNotFound(LessonId),
    #[error("lesson {0} is locked")]
    LessonLocked(LessonId),
    #[error("no quiz in progress")]
    NoActiveQuiz,
    #[error("a finished quiz has not been saved yet")]
    CommitPending,
    #[error("nothing to commit")]
    NothingToCommit,
    #[error("built-in lessons for track {track} are invalid")]
    Catalog {
        track: Track,
        #[source]
        source: LessonError,
    },
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// Errors emitted by `NotificationService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NotificationServiceError {
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
