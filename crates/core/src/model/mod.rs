mod ids;
mod lesson;
mod notification;
mod progress;
mod track;

pub use ids::{LessonId, NotificationId, ParseIdError, UserId};
pub use lesson::{Lesson, LessonDraft, LessonError, Question, QuestionError, ValidatedLesson};
pub use notification::{
    Notification, NotificationDraft, NotificationError, NotificationFilter, NotificationKind,
    welcome_notifications,
};
pub use progress::{CompletionOutcome, ProgressError, ReplayXpPolicy, TrackProgress, UserProgress};
pub use track::{Track, TrackError};
