use std::collections::HashMap;

use progression_core::model::{Lesson, LessonDraft, LessonId, Question, Track};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::SqliteRepository;
use super::mapping::{
    conn, encode_options, i64_to_u32, lesson_id_from_i64, lesson_id_to_i64, map_question_row,
    parse_track, ser,
};
use crate::repository::{LessonRepository, SeedOutcome, StorageError};

fn lesson_from_row(row: &SqliteRow, questions: Vec<Question>) -> Result<Lesson, StorageError> {
    let id = lesson_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let draft = LessonDraft {
        track: parse_track(row.try_get::<String, _>("track").map_err(ser)?)?,
        order: i64_to_u32("lesson_order", row.try_get::<i64, _>("lesson_order").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        xp_reward: i64_to_u32("xp_reward", row.try_get::<i64, _>("xp_reward").map_err(ser)?)?,
        questions,
    };
    Lesson::from_persisted(id, draft).map_err(ser)
}

async fn insert_questions(
    tx: &mut SqliteConnection,
    lesson_id: i64,
    questions: &[Question],
) -> Result<(), StorageError> {
    for (position, q) in questions.iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO questions (lesson_id, position, prompt, options_json, correct_option, explanation)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(lesson_id)
        .bind(i64::try_from(position).map_err(ser)?)
        .bind(q.prompt())
        .bind(encode_options(q.options())?)
        .bind(i64::try_from(q.correct_option()).map_err(ser)?)
        .bind(q.explanation())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
    }
    Ok(())
}

/// Insert a lesson row unless its `(track, order)` slot is taken.
/// Returns the new row id, or `None` when the slot was already filled.
async fn insert_lesson_row(
    tx: &mut SqliteConnection,
    draft: &LessonDraft,
) -> Result<Option<i64>, StorageError> {
    let validated = draft.clone().validate().map_err(ser)?;

    let res = sqlx::query(
        r"
        INSERT INTO lessons (track, lesson_order, title, description, xp_reward)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(track, lesson_order) DO NOTHING
        ",
    )
    .bind(validated.track().as_str())
    .bind(i64::from(validated.order()))
    .bind(draft.title.trim())
    .bind(draft.description.as_str())
    .bind(i64::from(draft.xp_reward))
    .execute(&mut *tx)
    .await
    .map_err(conn)?;

    if res.rows_affected() == 0 {
        return Ok(None);
    }
    let lesson_id = res.last_insert_rowid();
    insert_questions(tx, lesson_id, &draft.questions).await?;
    Ok(Some(lesson_id))
}

#[async_trait::async_trait]
impl LessonRepository for SqliteRepository {
    async fn lessons_for_track(&self, track: &Track) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, track, lesson_order, title, description, xp_reward
            FROM lessons
            WHERE track = ?1
            ORDER BY lesson_order ASC
            ",
        )
        .bind(track.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let question_rows = sqlx::query(
            r"
            SELECT q.lesson_id, q.position, q.prompt, q.options_json, q.correct_option, q.explanation
            FROM questions q
            JOIN lessons l ON l.id = q.lesson_id
            WHERE l.track = ?1
            ORDER BY q.lesson_id ASC, q.position ASC
            ",
        )
        .bind(track.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut questions: HashMap<i64, Vec<Question>> = HashMap::new();
        for row in &question_rows {
            let lesson_id: i64 = row.try_get("lesson_id").map_err(ser)?;
            questions
                .entry(lesson_id)
                .or_default()
                .push(map_question_row(row)?);
        }

        let mut lessons = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.try_get("id").map_err(ser)?;
            lessons.push(lesson_from_row(
                row,
                questions.remove(&id).unwrap_or_default(),
            )?);
        }
        Ok(lessons)
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let raw_id = lesson_id_to_i64(id)?;
        let row = sqlx::query(
            r"
            SELECT id, track, lesson_order, title, description, xp_reward
            FROM lessons WHERE id = ?1
            ",
        )
        .bind(raw_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let question_rows = sqlx::query(
            r"
            SELECT lesson_id, position, prompt, options_json, correct_option, explanation
            FROM questions
            WHERE lesson_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(raw_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let questions = question_rows
            .iter()
            .map(map_question_row)
            .collect::<Result<Vec<_>, _>>()?;
        lesson_from_row(&row, questions).map(Some)
    }

    async fn insert_lesson(&self, draft: &LessonDraft) -> Result<LessonId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        let Some(id) = insert_lesson_row(&mut tx, draft).await? else {
            return Err(StorageError::Conflict);
        };
        tx.commit().await.map_err(conn)?;
        lesson_id_from_i64(id)
    }

    async fn seed_lessons(
        &self,
        track: &Track,
        drafts: &[LessonDraft],
    ) -> Result<SeedOutcome, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        let mut inserted = 0;
        for draft in drafts.iter().filter(|d| &d.track == track) {
            if insert_lesson_row(&mut tx, draft).await?.is_some() {
                inserted += 1;
            }
        }
        tx.commit().await.map_err(conn)?;

        tracing::debug!(track = %track, inserted, "seeded lessons");
        let lessons = self.lessons_for_track(track).await?;
        Ok(SeedOutcome { lessons, inserted })
    }
}
