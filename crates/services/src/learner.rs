use serde::Serialize;

use progression_core::LevelProgress;
use progression_core::model::{UserId, UserProgress};

/// Signed-in learner: who they are and their last committed progress.
///
/// Created on sign-in and dropped on sign-out; nothing outlives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerContext {
    user: UserId,
    progress: UserProgress,
}

/// Dashboard figures for a learner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnerSummary {
    pub user: String,
    pub level: u32,
    pub total_xp: u64,
    pub lessons_completed: usize,
    pub level_progress: LevelProgress,
}

impl LearnerContext {
    #[must_use]
    pub fn new(user: UserId, progress: UserProgress) -> Self {
        Self { user, progress }
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    #[must_use]
    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    /// Replace progress after a successful commit.
    pub(crate) fn set_progress(&mut self, progress: UserProgress) {
        self.progress = progress;
    }

    #[must_use]
    pub fn summary(&self) -> LearnerSummary {
        LearnerSummary {
            user: self.user.to_string(),
            level: self.progress.level(),
            total_xp: self.progress.total_xp(),
            lessons_completed: self.progress.completed_count(),
            level_progress: self.progress.level_progress(),
        }
    }
}
