use progression_core::Clock;
use progression_core::model::{ReplayXpPolicy, UserId};
use storage::repository::Storage;

use crate::engine::ProgressionEngine;
use crate::error::{AppServicesError, EngineError};
use crate::notification_service::NotificationService;
use crate::progress_service::ProgressService;
use crate::sequencer_service::SequencerService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    policy: ReplayXpPolicy,
    sequencer: SequencerService,
    progress: ProgressService,
    notifications: NotificationService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage. `clock` stamps every stored row.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        policy: ReplayXpPolicy,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite_with_clock(db_url, clock).await?;
        Ok(Self::from_storage(&storage, clock, policy))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, policy: ReplayXpPolicy) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, policy)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, policy: ReplayXpPolicy) -> Self {
        Self {
            policy,
            sequencer: SequencerService::new(storage.lessons.clone()),
            progress: ProgressService::new(storage.progress.clone()),
            notifications: NotificationService::new(clock, storage.notifications.clone()),
        }
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    /// Open a progression engine for `user`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::LoadFailure` if the learner's progress cannot be read.
    pub async fn sign_in(&self, user: UserId) -> Result<ProgressionEngine, EngineError> {
        ProgressionEngine::sign_in(
            user,
            self.policy,
            self.sequencer.clone(),
            self.progress.clone(),
            self.notifications.clone(),
        )
        .await
    }
}
