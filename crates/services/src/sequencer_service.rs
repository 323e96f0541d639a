use std::collections::BTreeSet;
use std::sync::Arc;

use progression_core::TrackLessons;
use progression_core::catalog::default_lessons;
use progression_core::model::{Lesson, LessonId, Track};
use storage::repository::{LessonRepository, StorageError};

use crate::error::EngineError;

/// Loads track lessons, seeding the built-in catalog into empty tracks.
#[derive(Clone)]
pub struct SequencerService {
    lessons: Arc<dyn LessonRepository>,
}

impl SequencerService {
    #[must_use]
    pub fn new(lessons: Arc<dyn LessonRepository>) -> Self {
        Self { lessons }
    }

    /// Lessons of `track` sorted by order. An empty track is seeded first.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::LoadFailure` if the store cannot be read or
    /// seeded, and `EngineError::Catalog` if the built-in lessons are invalid.
    pub async fn lessons_for_track(&self, track: &Track) -> Result<Vec<Lesson>, EngineError> {
        let lessons = self
            .lessons
            .lessons_for_track(track)
            .await
            .map_err(EngineError::LoadFailure)?;
        if !lessons.is_empty() {
            return Ok(lessons);
        }
        self.seed(track).await
    }

    async fn seed(&self, track: &Track) -> Result<Vec<Lesson>, EngineError> {
        let drafts = default_lessons(track).map_err(|source| EngineError::Catalog {
            track: track.clone(),
            source,
        })?;
        if drafts.is_empty() {
            tracing::debug!(track = %track, "no built-in lessons for track");
            return Ok(Vec::new());
        }

        match self.lessons.seed_lessons(track, &drafts).await {
            Ok(outcome) => {
                tracing::debug!(track = %track, inserted = outcome.inserted, "seeded track");
                Ok(outcome.lessons)
            }
            Err(StorageError::Conflict) => {
                tracing::debug!(track = %track, "track seeded concurrently, re-reading");
                self.lessons
                    .lessons_for_track(track)
                    .await
                    .map_err(EngineError::LoadFailure)
            }
            Err(err) => Err(EngineError::LoadFailure(err)),
        }
    }

    /// Evaluate unlock state of every lesson in `track`.
    ///
    /// # Errors
    ///
    /// Same as [`lessons_for_track`](Self::lessons_for_track).
    pub async fn load_track(
        &self,
        track: &Track,
        completed: &BTreeSet<LessonId>,
    ) -> Result<TrackLessons, EngineError> {
        let lessons = self.lessons_for_track(track).await?;
        Ok(TrackLessons::evaluate(lessons, completed))
    }

    /// # Errors
    ///
    /// Returns `EngineError::LessonNotFound` for an unknown id and
    /// `EngineError::LoadFailure` if the store cannot be read.
    pub async fn get_lesson(&self, id: LessonId) -> Result<Lesson, EngineError> {
        self.lessons
            .get_lesson(id)
            .await
            .map_err(EngineError::LoadFailure)?
            .ok_or(EngineError::LessonNotFound(id))
    }
}
