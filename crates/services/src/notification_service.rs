use std::sync::Arc;

use progression_core::Clock;
use progression_core::model::{
    Notification, NotificationDraft, NotificationFilter, NotificationId, NotificationKind,
    UserId, welcome_notifications,
};
use storage::repository::NotificationRepository;

use crate::error::NotificationServiceError;

/// Default page size for notification listings.
pub const DEFAULT_NOTIFICATION_LIMIT: u32 = 50;

/// Per-user notification feed.
#[derive(Clone)]
pub struct NotificationService {
    clock: Clock,
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    #[must_use]
    pub fn new(clock: Clock, notifications: Arc<dyn NotificationRepository>) -> Self {
        Self {
            clock,
            notifications,
        }
    }

    /// Store a notification for `user`.
    ///
    /// # Errors
    ///
    /// Returns `NotificationServiceError::Notification` for an empty title and
    /// `NotificationServiceError::Storage` if the append fails.
    pub async fn push(
        &self,
        user: &UserId,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> Result<NotificationId, NotificationServiceError> {
        let draft = NotificationDraft::new(kind, title, message, self.clock.now())?;
        Ok(self.notifications.append_notification(user, &draft).await?)
    }

    /// Fire-and-forget variant of [`push`](Self::push). Failures are logged and dropped.
    pub async fn emit(&self, user: &UserId, kind: NotificationKind, title: &str, message: &str) {
        match self.push(user, kind, title, message).await {
            Ok(id) => tracing::debug!(user = %user, %id, kind = kind.as_str(), "notification emitted"),
            Err(err) => {
                tracing::warn!(user = %user, kind = kind.as_str(), error = %err, "dropping notification");
            }
        }
    }

    /// Newest first. A learner's first look at an empty feed stores the
    /// welcome notifications.
    ///
    /// # Errors
    ///
    /// Returns `NotificationServiceError::Storage` if the feed cannot be read.
    pub async fn list(
        &self,
        user: &UserId,
        filter: NotificationFilter,
        limit: u32,
    ) -> Result<Vec<Notification>, NotificationServiceError> {
        if self
            .notifications
            .seed_welcome(user, &welcome_notifications(self.clock.now()))
            .await?
        {
            tracing::info!(user = %user, "welcome notifications created");
        }
        Ok(self
            .notifications
            .list_notifications(user, filter, limit)
            .await?)
    }

    /// # Errors
    ///
    /// Returns `NotificationServiceError::Storage` if the feed cannot be read.
    pub async fn unread_count(&self, user: &UserId) -> Result<u32, NotificationServiceError> {
        Ok(self.notifications.unread_count(user).await?)
    }

    /// # Errors
    ///
    /// Returns `NotificationServiceError::Storage` with `StorageError::NotFound`
    /// if the user has no such notification.
    pub async fn mark_read(
        &self,
        user: &UserId,
        id: NotificationId,
    ) -> Result<(), NotificationServiceError> {
        Ok(self.notifications.mark_read(user, id).await?)
    }

    /// Returns how many notifications were unread.
    ///
    /// # Errors
    ///
    /// Returns `NotificationServiceError::Storage` if the update fails.
    pub async fn mark_all_read(&self, user: &UserId) -> Result<u32, NotificationServiceError> {
        Ok(self.notifications.mark_all_read(user).await?)
    }

    /// # Errors
    ///
    /// Returns `NotificationServiceError::Storage` with `StorageError::NotFound`
    /// if the user has no such notification.
    pub async fn delete(
        &self,
        user: &UserId,
        id: NotificationId,
    ) -> Result<(), NotificationServiceError> {
        Ok(self.notifications.delete_notification(user, id).await?)
    }

    /// Returns how many notifications were removed.
    ///
    /// # Errors
    ///
    /// Returns `NotificationServiceError::Storage` if the delete fails.
    pub async fn clear(&self, user: &UserId) -> Result<u32, NotificationServiceError> {
        let removed = self.notifications.clear_notifications(user).await?;
        tracing::debug!(user = %user, removed, "notifications cleared");
        Ok(removed)
    }
}
