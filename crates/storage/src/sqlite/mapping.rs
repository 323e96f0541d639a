use progression_core::model::{
    LessonId, Notification, NotificationId, NotificationKind, Question, Track,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn lesson_id_to_i64(id: LessonId) -> Result<i64, StorageError> {
    u64_to_i64("lesson_id", id.value())
}

pub(crate) fn notification_id_from_i64(v: i64) -> Result<NotificationId, StorageError> {
    Ok(NotificationId::new(i64_to_u64("notification_id", v)?))
}

pub(crate) fn total_xp_from_i64(v: i64) -> Result<u64, StorageError> {
    i64_to_u64("total_xp", v)
}

pub(crate) fn parse_track(s: String) -> Result<Track, StorageError> {
    Track::new(s).map_err(ser)
}

/// Options are stored as a JSON array of strings.
pub(crate) fn encode_options(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let options_json: String = row.try_get("options_json").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;
    let correct: i64 = row.try_get("correct_option").map_err(ser)?;
    let correct = usize::try_from(correct)
        .map_err(|_| StorageError::Serialization(format!("invalid correct_option: {correct}")))?;

    Question::new(
        row.try_get::<String, _>("prompt").map_err(ser)?,
        options,
        correct,
        row.try_get::<String, _>("explanation").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_notification_row(row: &SqliteRow) -> Result<Notification, StorageError> {
    let kind: String = row.try_get("kind").map_err(ser)?;
    Ok(Notification {
        id: notification_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        kind: NotificationKind::parse(&kind).map_err(ser)?,
        title: row.try_get("title").map_err(ser)?,
        message: row.try_get("message").map_err(ser)?,
        read: row.try_get::<i64, _>("read").map_err(ser)? != 0,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
