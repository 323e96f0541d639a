use progression_core::model::{
    Notification, NotificationDraft, NotificationFilter, NotificationId, UserId,
};

use super::SqliteRepository;
use super::mapping::{
    conn, i64_to_u32, map_notification_row, notification_id_from_i64, u64_to_i64,
};
use crate::repository::{NotificationRepository, StorageError};

fn filter_clause(filter: NotificationFilter) -> &'static str {
    match filter {
        NotificationFilter::All => "",
        NotificationFilter::Unread => "AND read = 0",
        NotificationFilter::System => "AND kind = 'system'",
        NotificationFilter::Community => "AND kind IN ('community', 'achievement')",
    }
}

fn affected(rows: u64) -> u32 {
    u32::try_from(rows).unwrap_or(u32::MAX)
}

#[async_trait::async_trait]
impl NotificationRepository for SqliteRepository {
    async fn append_notification(
        &self,
        user: &UserId,
        draft: &NotificationDraft,
    ) -> Result<NotificationId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO notifications (user_id, kind, title, message, read, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5)
            ",
        )
        .bind(user.as_str())
        .bind(draft.kind().as_str())
        .bind(draft.title())
        .bind(draft.message())
        .bind(draft.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        notification_id_from_i64(res.last_insert_rowid())
    }

    async fn list_notifications(
        &self,
        user: &UserId,
        filter: NotificationFilter,
        limit: u32,
    ) -> Result<Vec<Notification>, StorageError> {
        let sql = format!(
            r"
            SELECT id, kind, title, message, read, created_at
            FROM notifications
            WHERE user_id = ?1 {}
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            ",
            filter_clause(filter)
        );
        let rows = sqlx::query(&sql)
            .bind(user.as_str())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_notification_row).collect()
    }

    async fn seed_welcome(
        &self,
        user: &UserId,
        drafts: &[NotificationDraft],
    ) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let claimed = sqlx::query(
            r"
            INSERT INTO notification_welcomes (user_id, welcomed_at)
            VALUES (?1, ?2)
            ON CONFLICT(user_id) DO NOTHING
            ",
        )
        .bind(user.as_str())
        .bind(self.clock.now())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        if claimed.rows_affected() == 0 {
            return Ok(false);
        }

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?1")
            .bind(user.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(conn)?;

        if existing == 0 {
            for draft in drafts {
                sqlx::query(
                    r"
                    INSERT INTO notifications (user_id, kind, title, message, read, created_at)
                    VALUES (?1, ?2, ?3, ?4, 0, ?5)
                    ",
                )
                .bind(user.as_str())
                .bind(draft.kind().as_str())
                .bind(draft.title())
                .bind(draft.message())
                .bind(draft.created_at())
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
            }
        }

        tx.commit().await.map_err(conn)?;
        Ok(existing == 0 && !drafts.is_empty())
    }

    async fn mark_read(&self, user: &UserId, id: NotificationId) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE notifications SET read = 1 WHERE user_id = ?1 AND id = ?2")
            .bind(user.as_str())
            .bind(u64_to_i64("notification_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn unread_count(&self, user: &UserId) -> Result<u32, StorageError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0")
                .bind(user.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(conn)?;
        i64_to_u32("unread_count", count)
    }

    async fn mark_all_read(&self, user: &UserId) -> Result<u32, StorageError> {
        let res = sqlx::query("UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0")
            .bind(user.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        Ok(affected(res.rows_affected()))
    }

    async fn delete_notification(
        &self,
        user: &UserId,
        id: NotificationId,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM notifications WHERE user_id = ?1 AND id = ?2")
            .bind(user.as_str())
            .bind(u64_to_i64("notification_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn clear_notifications(&self, user: &UserId) -> Result<u32, StorageError> {
        let res = sqlx::query("DELETE FROM notifications WHERE user_id = ?1")
            .bind(user.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        Ok(affected(res.rows_affected()))
    }
}
