use std::sync::Arc;

use progression_core::model::{UserId, UserProgress};
use storage::repository::ProgressRepository;

use crate::error::EngineError;

/// Reads and overwrites per-user progress documents.
#[derive(Clone)]
pub struct ProgressService {
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressRepository>) -> Self {
        Self { progress }
    }

    /// Progress of `user`, the zero record on first access.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::LoadFailure` if the record cannot be read or created.
    pub async fn load(&self, user: &UserId) -> Result<UserProgress, EngineError> {
        self.progress
            .get_or_init_progress(user)
            .await
            .map_err(EngineError::LoadFailure)
    }

    /// Overwrite the whole progress document.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::SaveFailure` if the write fails.
    pub async fn save(&self, user: &UserId, progress: &UserProgress) -> Result<(), EngineError> {
        self.progress
            .save_progress(user, progress)
            .await
            .map_err(EngineError::SaveFailure)
    }
}
