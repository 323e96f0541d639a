use progression_core::model::{TrackProgress, UserId, UserProgress};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    conn, i64_to_u32, lesson_id_from_i64, lesson_id_to_i64, parse_track, ser, total_xp_from_i64,
    u64_to_i64,
};
use crate::repository::{ProgressRepository, StorageError};

impl SqliteRepository {
    async fn load_progress(&self, user: &UserId, total_xp: i64) -> Result<UserProgress, StorageError> {
        let completed_rows = sqlx::query(
            r"
            SELECT lesson_id FROM completed_lessons
            WHERE user_id = ?1
            ORDER BY lesson_id ASC
            ",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let track_rows = sqlx::query(
            r"
            SELECT track, completed_count, total_count FROM track_progress
            WHERE user_id = ?1
            ",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let completed = completed_rows
            .iter()
            .map(|row| lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tracks = Vec::with_capacity(track_rows.len());
        for row in &track_rows {
            let track = parse_track(row.try_get::<String, _>("track").map_err(ser)?)?;
            let progress = TrackProgress {
                completed_count: i64_to_u32(
                    "completed_count",
                    row.try_get::<i64, _>("completed_count").map_err(ser)?,
                )?,
                total_count: i64_to_u32(
                    "total_count",
                    row.try_get::<i64, _>("total_count").map_err(ser)?,
                )?,
            };
            tracks.push((track, progress));
        }

        UserProgress::from_persisted(total_xp_from_i64(total_xp)?, completed, tracks).map_err(ser)
    }
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_or_init_progress(&self, user: &UserId) -> Result<UserProgress, StorageError> {
        let row = sqlx::query("SELECT total_xp FROM user_progress WHERE user_id = ?1")
            .bind(user.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        if let Some(row) = row {
            let total_xp: i64 = row.try_get("total_xp").map_err(ser)?;
            return self.load_progress(user, total_xp).await;
        }

        sqlx::query(
            r"
            INSERT INTO user_progress (user_id, total_xp, updated_at)
            VALUES (?1, 0, ?2)
            ON CONFLICT(user_id) DO NOTHING
            ",
        )
        .bind(user.as_str())
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        tracing::debug!(user = %user, "initialized progress record");
        Ok(UserProgress::new())
    }

    async fn save_progress(
        &self,
        user: &UserId,
        progress: &UserProgress,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO user_progress (user_id, total_xp, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                total_xp = excluded.total_xp,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user.as_str())
        .bind(u64_to_i64("total_xp", progress.total_xp())?)
        .bind(self.clock.now())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM completed_lessons WHERE user_id = ?1")
            .bind(user.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for lesson_id in progress.completed_lessons() {
            sqlx::query("INSERT INTO completed_lessons (user_id, lesson_id) VALUES (?1, ?2)")
                .bind(user.as_str())
                .bind(lesson_id_to_i64(*lesson_id)?)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        sqlx::query("DELETE FROM track_progress WHERE user_id = ?1")
            .bind(user.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (track, tp) in progress.tracks() {
            sqlx::query(
                r"
                INSERT INTO track_progress (user_id, track, completed_count, total_count)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(user.as_str())
            .bind(track.as_str())
            .bind(i64::from(tp.completed_count))
            .bind(i64::from(tp.total_count))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
