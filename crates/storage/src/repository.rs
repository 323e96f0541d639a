use async_trait::async_trait;
use progression_core::model::{
    Lesson, LessonDraft, LessonId, Notification, NotificationDraft, NotificationFilter,
    NotificationId, Track, UserId, UserProgress,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result of seeding starter lessons into a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOutcome {
    /// All lessons of the track after seeding, sorted by order.
    pub lessons: Vec<Lesson>,
    /// How many drafts were actually written; 0 when the track was already seeded.
    pub inserted: usize,
}

/// Lesson content store.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Lessons of a track sorted by order ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn lessons_for_track(&self, track: &Track) -> Result<Vec<Lesson>, StorageError>;

    /// Fetch a single lesson by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// Insert one lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the track already has a lesson at that order.
    async fn insert_lesson(&self, draft: &LessonDraft) -> Result<LessonId, StorageError>;

    /// Insert the drafts whose `(track, order)` slot is still free, then return
    /// the whole track. Running it twice leaves a single copy of each lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or written.
    async fn seed_lessons(
        &self,
        track: &Track,
        drafts: &[LessonDraft],
    ) -> Result<SeedOutcome, StorageError>;
}

/// Per-user progress documents.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load a user's progress, creating and persisting the zero record on first access.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be read or created.
    async fn get_or_init_progress(&self, user: &UserId) -> Result<UserProgress, StorageError>;

    /// Overwrite the whole progress document for `user`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails; nothing is partially applied.
    async fn save_progress(&self, user: &UserId, progress: &UserProgress)
    -> Result<(), StorageError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the notification cannot be stored.
    async fn append_notification(
        &self,
        user: &UserId,
        draft: &NotificationDraft,
    ) -> Result<NotificationId, StorageError>;

    /// Newest first, at most `limit` entries matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_notifications(
        &self,
        user: &UserId,
        filter: NotificationFilter,
        limit: u32,
    ) -> Result<Vec<Notification>, StorageError>;

    /// Store `drafts` for a user who has never been welcomed and whose feed is
    /// empty. The user counts as welcomed afterwards either way, so later calls
    /// write nothing. Returns whether anything was written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or written.
    async fn seed_welcome(
        &self,
        user: &UserId,
        drafts: &[NotificationDraft],
    ) -> Result<bool, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user has no such notification.
    async fn mark_read(&self, user: &UserId, id: NotificationId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn unread_count(&self, user: &UserId) -> Result<u32, StorageError>;

    /// Returns how many notifications changed state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the update fails.
    async fn mark_all_read(&self, user: &UserId) -> Result<u32, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user has no such notification.
    async fn delete_notification(&self, user: &UserId, id: NotificationId)
    -> Result<(), StorageError>;

    /// Remove every notification of `user`; returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn clear_notifications(&self, user: &UserId) -> Result<u32, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    lessons: Arc<Mutex<LessonTable>>,
    progress: Arc<Mutex<HashMap<UserId, UserProgress>>>,
    notifications: Arc<Mutex<NotificationTable>>,
}

#[derive(Default)]
struct LessonTable {
    next_id: u64,
    rows: BTreeMap<LessonId, Lesson>,
}

impl LessonTable {
    fn slot_taken(&self, track: &Track, order: u32) -> bool {
        self.rows
            .values()
            .any(|l| l.track() == track && l.order() == order)
    }

    fn insert(&mut self, draft: &LessonDraft) -> Result<LessonId, StorageError> {
        if self.slot_taken(&draft.track, draft.order) {
            return Err(StorageError::Conflict);
        }
        let validated = draft
            .clone()
            .validate()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.next_id += 1;
        let id = LessonId::new(self.next_id);
        self.rows.insert(id, validated.assign_id(id));
        Ok(id)
    }

    fn track(&self, track: &Track) -> Vec<Lesson> {
        let mut lessons: Vec<Lesson> = self
            .rows
            .values()
            .filter(|l| l.track() == track)
            .cloned()
            .collect();
        lessons.sort_by_key(Lesson::order);
        lessons
    }
}

#[derive(Default)]
struct NotificationTable {
    next_id: u64,
    rows: HashMap<UserId, Vec<Notification>>,
    welcomed: HashSet<UserId>,
}

impl NotificationTable {
    fn append(&mut self, user: &UserId, draft: &NotificationDraft) -> NotificationId {
        self.next_id += 1;
        let id = NotificationId::new(self.next_id);
        self.rows
            .entry(user.clone())
            .or_default()
            .push(draft.clone().assign_id(id));
        id
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn lessons_for_track(&self, track: &Track) -> Result<Vec<Lesson>, StorageError> {
        let guard = self.lessons.lock().map_err(poisoned)?;
        Ok(guard.track(track))
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let guard = self.lessons.lock().map_err(poisoned)?;
        Ok(guard.rows.get(&id).cloned())
    }

    async fn insert_lesson(&self, draft: &LessonDraft) -> Result<LessonId, StorageError> {
        let mut guard = self.lessons.lock().map_err(poisoned)?;
        guard.insert(draft)
    }

    async fn seed_lessons(
        &self,
        track: &Track,
        drafts: &[LessonDraft],
    ) -> Result<SeedOutcome, StorageError> {
        let mut guard = self.lessons.lock().map_err(poisoned)?;
        let mut inserted = 0;
        for draft in drafts.iter().filter(|d| &d.track == track) {
            if guard.slot_taken(&draft.track, draft.order) {
                continue;
            }
            guard.insert(draft)?;
            inserted += 1;
        }
        Ok(SeedOutcome {
            lessons: guard.track(track),
            inserted,
        })
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_or_init_progress(&self, user: &UserId) -> Result<UserProgress, StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.entry(user.clone()).or_default().clone())
    }

    async fn save_progress(
        &self,
        user: &UserId,
        progress: &UserProgress,
    ) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        guard.insert(user.clone(), progress.clone());
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryRepository {
    async fn append_notification(
        &self,
        user: &UserId,
        draft: &NotificationDraft,
    ) -> Result<NotificationId, StorageError> {
        let mut guard = self.notifications.lock().map_err(poisoned)?;
        Ok(guard.append(user, draft))
    }

    async fn list_notifications(
        &self,
        user: &UserId,
        filter: NotificationFilter,
        limit: u32,
    ) -> Result<Vec<Notification>, StorageError> {
        let guard = self.notifications.lock().map_err(poisoned)?;
        let mut items: Vec<Notification> = guard
            .rows
            .get(user)
            .map(|items| items.iter().filter(|n| filter.matches(n)).cloned().collect())
            .unwrap_or_default();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        items.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(items)
    }

    async fn seed_welcome(
        &self,
        user: &UserId,
        drafts: &[NotificationDraft],
    ) -> Result<bool, StorageError> {
        let mut guard = self.notifications.lock().map_err(poisoned)?;
        if !guard.welcomed.insert(user.clone()) {
            return Ok(false);
        }
        if guard.rows.get(user).is_some_and(|items| !items.is_empty()) {
            return Ok(false);
        }
        for draft in drafts {
            guard.append(user, draft);
        }
        Ok(!drafts.is_empty())
    }

    async fn mark_read(&self, user: &UserId, id: NotificationId) -> Result<(), StorageError> {
        let mut guard = self.notifications.lock().map_err(poisoned)?;
        let item = guard
            .rows
            .get_mut(user)
            .and_then(|items| items.iter_mut().find(|n| n.id == id))
            .ok_or(StorageError::NotFound)?;
        item.read = true;
        Ok(())
    }

    async fn unread_count(&self, user: &UserId) -> Result<u32, StorageError> {
        let guard = self.notifications.lock().map_err(poisoned)?;
        let count = guard
            .rows
            .get(user)
            .map_or(0, |items| items.iter().filter(|n| !n.read).count());
        Ok(saturating_u32(count))
    }

    async fn mark_all_read(&self, user: &UserId) -> Result<u32, StorageError> {
        let mut guard = self.notifications.lock().map_err(poisoned)?;
        let mut changed = 0_u32;
        if let Some(items) = guard.rows.get_mut(user) {
            for item in items.iter_mut().filter(|n| !n.read) {
                item.read = true;
                changed = changed.saturating_add(1);
            }
        }
        Ok(changed)
    }

    async fn delete_notification(
        &self,
        user: &UserId,
        id: NotificationId,
    ) -> Result<(), StorageError> {
        let mut guard = self.notifications.lock().map_err(poisoned)?;
        let items = guard.rows.get_mut(user).ok_or(StorageError::NotFound)?;
        let pos = items
            .iter()
            .position(|n| n.id == id)
            .ok_or(StorageError::NotFound)?;
        items.remove(pos);
        Ok(())
    }

    async fn clear_notifications(&self, user: &UserId) -> Result<u32, StorageError> {
        let mut guard = self.notifications.lock().map_err(poisoned)?;
        let removed = guard.rows.remove(user).map_or(0, |items| items.len());
        Ok(saturating_u32(removed))
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub lessons: Arc<dyn LessonRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let lessons: Arc<dyn LessonRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let notifications: Arc<dyn NotificationRepository> = Arc::new(repo);
        Self {
            lessons,
            progress,
            notifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progression_core::catalog::default_lessons;
    use progression_core::model::{LessonDraft, NotificationKind, Question};
    use progression_core::time::fixed_now;

    fn track() -> Track {
        Track::new("javascript").unwrap()
    }

    fn draft(order: u32) -> LessonDraft {
        LessonDraft {
            track: track(),
            order,
            title: format!("Lesson {order}"),
            description: String::new(),
            xp_reward: 10,
            questions: vec![Question::new("Q", vec!["a".into(), "b".into()], 0, "").unwrap()],
        }
    }

    #[tokio::test]
    async fn seeding_twice_keeps_one_copy() {
        let repo = InMemoryRepository::new();
        let drafts = default_lessons(&track()).unwrap();

        let first = repo.seed_lessons(&track(), &drafts).await.unwrap();
        let second = repo.seed_lessons(&track(), &drafts).await.unwrap();

        assert_eq!(first.inserted, drafts.len());
        assert_eq!(second.inserted, 0);
        assert_eq!(second.lessons, first.lessons);
        assert_eq!(
            repo.lessons_for_track(&track()).await.unwrap().len(),
            drafts.len()
        );
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_order() {
        let repo = InMemoryRepository::new();
        repo.insert_lesson(&draft(1)).await.unwrap();
        let err = repo.insert_lesson(&draft(1)).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn lessons_come_back_sorted() {
        let repo = InMemoryRepository::new();
        repo.insert_lesson(&draft(3)).await.unwrap();
        repo.insert_lesson(&draft(1)).await.unwrap();
        repo.insert_lesson(&draft(2)).await.unwrap();

        let orders: Vec<u32> = repo
            .lessons_for_track(&track())
            .await
            .unwrap()
            .iter()
            .map(Lesson::order)
            .collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn progress_is_created_on_first_access() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1").unwrap();
        let progress = repo.get_or_init_progress(&user).await.unwrap();
        assert_eq!(progress, UserProgress::new());
    }

    #[tokio::test]
    async fn notifications_list_newest_first_and_mark_read() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1").unwrap();
        let older = NotificationDraft::new(NotificationKind::System, "Welcome", "", fixed_now())
            .unwrap();
        let newer = NotificationDraft::new(
            NotificationKind::Achievement,
            "Perfect quiz",
            "",
            fixed_now() + chrono::Duration::minutes(1),
        )
        .unwrap();
        let first = repo.append_notification(&user, &older).await.unwrap();
        repo.append_notification(&user, &newer).await.unwrap();

        let listed = repo
            .list_notifications(&user, NotificationFilter::All, 10)
            .await
            .unwrap();
        assert_eq!(listed[0].title, "Perfect quiz");

        assert_eq!(repo.unread_count(&user).await.unwrap(), 2);
        repo.mark_read(&user, first).await.unwrap();
        assert_eq!(repo.unread_count(&user).await.unwrap(), 1);
        assert_eq!(repo.mark_all_read(&user).await.unwrap(), 1);
        assert!(matches!(
            repo.mark_read(&user, NotificationId::new(99)).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn filters_delete_and_clear_stay_per_user() {
        let repo = InMemoryRepository::new();
        let alice = UserId::new("alice").unwrap();
        let bob = UserId::new("bob").unwrap();
        for (kind, title) in [
            (NotificationKind::System, "Maintenance"),
            (NotificationKind::Achievement, "Perfect quiz"),
            (NotificationKind::Lesson, "Level 2"),
        ] {
            let draft = NotificationDraft::new(kind, title, "", fixed_now()).unwrap();
            repo.append_notification(&alice, &draft).await.unwrap();
        }
        let theirs = NotificationDraft::new(NotificationKind::System, "Hi", "", fixed_now()).unwrap();
        let bobs = repo.append_notification(&bob, &theirs).await.unwrap();

        let community = repo
            .list_notifications(&alice, NotificationFilter::Community, 10)
            .await
            .unwrap();
        assert_eq!(community.len(), 1);
        assert_eq!(community[0].title, "Perfect quiz");

        assert!(matches!(
            repo.delete_notification(&alice, bobs).await,
            Err(StorageError::NotFound)
        ));
        repo.delete_notification(&alice, community[0].id).await.unwrap();
        assert_eq!(repo.unread_count(&alice).await.unwrap(), 2);

        assert_eq!(repo.clear_notifications(&alice).await.unwrap(), 2);
        assert_eq!(repo.unread_count(&alice).await.unwrap(), 0);
        assert_eq!(repo.unread_count(&bob).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn welcome_is_written_once_and_only_into_an_empty_feed() {
        let repo = InMemoryRepository::new();
        let fresh = UserId::new("fresh").unwrap();
        let busy = UserId::new("busy").unwrap();
        let drafts = progression_core::model::welcome_notifications(fixed_now());

        assert!(repo.seed_welcome(&fresh, &drafts).await.unwrap());
        assert!(!repo.seed_welcome(&fresh, &drafts).await.unwrap());
        assert_eq!(repo.unread_count(&fresh).await.unwrap(), 3);

        repo.clear_notifications(&fresh).await.unwrap();
        assert!(!repo.seed_welcome(&fresh, &drafts).await.unwrap());

        let level = NotificationDraft::new(NotificationKind::Lesson, "Level 2", "", fixed_now()).unwrap();
        repo.append_notification(&busy, &level).await.unwrap();
        assert!(!repo.seed_welcome(&busy, &drafts).await.unwrap());
        assert_eq!(repo.unread_count(&busy).await.unwrap(), 1);
    }
}
