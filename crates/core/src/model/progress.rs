use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::level::{level_for_xp, LevelProgress};
use crate::model::ids::LessonId;
use crate::model::lesson::Lesson;
use crate::model::track::Track;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("track {track} has {completed} completed lessons but only {total} in total")]
    CountExceedsTotal {
        track: Track,
        completed: u32,
        total: u32,
    },
}

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// How XP is granted when a lesson that is already complete is played again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayXpPolicy {
    /// Only the first completion of a lesson earns XP; replays earn nothing.
    ///
    /// Finishing counts as completion at any score, so a first attempt with
    /// no correct answers completes the lesson for 0 XP and its reward can no
    /// longer be earned. Use `AwardEveryAttempt` to let replays pay out.
    #[default]
    FirstCompletionOnly,
    /// Every finished attempt adds its earned XP, replays included.
    AwardEveryAttempt,
}

impl std::str::FromStr for ReplayXpPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "first" | "first_completion_only" => Ok(Self::FirstCompletionOnly),
            "every" | "award_every_attempt" => Ok(Self::AwardEveryAttempt),
            other => Err(format!("unknown replay XP policy: {other}")),
        }
    }
}

//
// ─── TRACK PROGRESS ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackProgress {
    pub completed_count: u32,
    pub total_count: u32,
}

impl TrackProgress {
    /// Completion percentage, 0 when the track size is unknown.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total_count == 0 {
            return 0;
        }
        let pct = u64::from(self.completed_count.min(self.total_count)) * 100
            / u64::from(self.total_count);
        u8::try_from(pct).unwrap_or(100)
    }
}

//
// ─── USER PROGRESS ─────────────────────────────────────────────────────────────
//

/// Persistent learning progress of one user.
///
/// `total_xp` never decreases and a lesson id is recorded at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProgress {
    total_xp: u64,
    completed_lessons: BTreeSet<LessonId>,
    track_progress: BTreeMap<Track, TrackProgress>,
}

/// What a completion commit changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub xp_awarded: u64,
    pub newly_completed: bool,
    pub level_before: u32,
    pub level_after: u32,
}

impl CompletionOutcome {
    #[must_use]
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

impl UserProgress {
    /// Zero-value record for a user seen for the first time.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate progress from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::CountExceedsTotal` if a track claims more
    /// completions than it has lessons.
    pub fn from_persisted(
        total_xp: u64,
        completed_lessons: impl IntoIterator<Item = LessonId>,
        track_progress: impl IntoIterator<Item = (Track, TrackProgress)>,
    ) -> Result<Self, ProgressError> {
        let track_progress: BTreeMap<Track, TrackProgress> = track_progress.into_iter().collect();
        for (track, p) in &track_progress {
            if p.total_count > 0 && p.completed_count > p.total_count {
                return Err(ProgressError::CountExceedsTotal {
                    track: track.clone(),
                    completed: p.completed_count,
                    total: p.total_count,
                });
            }
        }

        Ok(Self {
            total_xp,
            completed_lessons: completed_lessons.into_iter().collect(),
            track_progress,
        })
    }

    #[must_use]
    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        level_for_xp(self.total_xp)
    }

    #[must_use]
    pub fn level_progress(&self) -> LevelProgress {
        LevelProgress::from_total_xp(self.total_xp)
    }

    #[must_use]
    pub fn completed_lessons(&self) -> &BTreeSet<LessonId> {
        &self.completed_lessons
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed_lessons.len()
    }

    #[must_use]
    pub fn is_completed(&self, lesson: LessonId) -> bool {
        self.completed_lessons.contains(&lesson)
    }

    #[must_use]
    pub fn track_progress(&self, track: &Track) -> TrackProgress {
        self.track_progress.get(track).copied().unwrap_or_default()
    }

    pub fn tracks(&self) -> impl Iterator<Item = (&Track, &TrackProgress)> {
        self.track_progress.iter()
    }

    /// Merge a finished quiz into the progress record.
    ///
    /// `track_total` is the number of lessons currently in the lesson's track.
    /// The lesson is recorded once; the track count only moves on the first
    /// completion. XP follows `policy` and saturates instead of overflowing.
    pub fn record_completion(
        &mut self,
        lesson: &Lesson,
        earned_xp: u64,
        track_total: usize,
        policy: ReplayXpPolicy,
    ) -> CompletionOutcome {
        let level_before = self.level();
        let newly_completed = self.completed_lessons.insert(lesson.id());

        let xp_awarded = match policy {
            ReplayXpPolicy::AwardEveryAttempt => earned_xp,
            ReplayXpPolicy::FirstCompletionOnly if newly_completed => earned_xp,
            ReplayXpPolicy::FirstCompletionOnly => 0,
        };
        self.total_xp = self.total_xp.saturating_add(xp_awarded);

        let entry = self.track_progress.entry(lesson.track().clone()).or_default();
        if newly_completed {
            entry.completed_count = entry.completed_count.saturating_add(1);
        }
        let total = u32::try_from(track_total).unwrap_or(u32::MAX);
        entry.total_count = total.max(entry.completed_count);

        CompletionOutcome {
            xp_awarded,
            newly_completed,
            level_before,
            level_after: self.level(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lesson::{LessonDraft, Question};

    fn lesson(id: u64, track: &str, order: u32) -> Lesson {
        let q = Question::new("Q", vec!["a".into(), "b".into()], 0, "").unwrap();
        Lesson::from_persisted(
            LessonId::new(id),
            LessonDraft {
                track: Track::new(track).unwrap(),
                order,
                title: format!("Lesson {order}"),
                description: String::new(),
                xp_reward: 50,
                questions: vec![q],
            },
        )
        .unwrap()
    }

    #[test]
    fn first_completion_records_lesson_and_count() {
        let mut progress = UserProgress::new();
        let l = lesson(1, "python", 1);

        let outcome = progress.record_completion(&l, 50, 3, ReplayXpPolicy::FirstCompletionOnly);

        assert!(outcome.newly_completed);
        assert_eq!(outcome.xp_awarded, 50);
        assert_eq!(progress.total_xp(), 50);
        assert!(progress.is_completed(l.id()));
        let tp = progress.track_progress(l.track());
        assert_eq!(tp.completed_count, 1);
        assert_eq!(tp.total_count, 3);
        assert_eq!(tp.percent(), 33);
    }

    #[test]
    fn replay_does_not_double_count() {
        let mut progress = UserProgress::new();
        let l = lesson(1, "python", 1);
        progress.record_completion(&l, 50, 2, ReplayXpPolicy::FirstCompletionOnly);

        let outcome = progress.record_completion(&l, 50, 2, ReplayXpPolicy::FirstCompletionOnly);

        assert!(!outcome.newly_completed);
        assert_eq!(outcome.xp_awarded, 0);
        assert_eq!(progress.total_xp(), 50);
        assert_eq!(progress.completed_count(), 1);
        assert_eq!(progress.track_progress(l.track()).completed_count, 1);
    }

    #[test]
    fn award_every_attempt_regrants_xp_but_keeps_counts() {
        let mut progress = UserProgress::new();
        let l = lesson(1, "python", 1);
        progress.record_completion(&l, 50, 2, ReplayXpPolicy::AwardEveryAttempt);
        let outcome = progress.record_completion(&l, 25, 2, ReplayXpPolicy::AwardEveryAttempt);

        assert_eq!(outcome.xp_awarded, 25);
        assert_eq!(progress.total_xp(), 75);
        assert_eq!(progress.completed_count(), 1);
        assert_eq!(progress.track_progress(l.track()).completed_count, 1);
    }

    #[test]
    fn zero_score_first_completion_forfeits_the_reward() {
        let mut progress = UserProgress::new();
        let l = lesson(1, "python", 1);

        let first = progress.record_completion(&l, 0, 3, ReplayXpPolicy::FirstCompletionOnly);
        assert!(first.newly_completed);
        assert_eq!(first.xp_awarded, 0);

        let perfect = progress.record_completion(&l, 50, 3, ReplayXpPolicy::FirstCompletionOnly);
        assert_eq!(perfect.xp_awarded, 0);
        assert_eq!(progress.total_xp(), 0);
        assert!(progress.is_completed(l.id()));

        let paid = progress.record_completion(&l, 50, 3, ReplayXpPolicy::AwardEveryAttempt);
        assert_eq!(paid.xp_awarded, 50);
    }

    #[test]
    fn level_up_is_reported() {
        let mut progress = UserProgress::from_persisted(90, [], []).unwrap();
        let outcome = progress.record_completion(
            &lesson(2, "html", 1),
            40,
            1,
            ReplayXpPolicy::FirstCompletionOnly,
        );
        assert_eq!(outcome.level_before, 1);
        assert_eq!(outcome.level_after, 2);
        assert!(outcome.leveled_up());
    }

    #[test]
    fn persisted_counts_are_validated() {
        let err = UserProgress::from_persisted(
            0,
            [],
            [(
                Track::new("python").unwrap(),
                TrackProgress {
                    completed_count: 4,
                    total_count: 2,
                },
            )],
        )
        .unwrap_err();
        assert!(matches!(err, ProgressError::CountExceedsTotal { .. }));
    }

    #[test]
    fn replay_policy_parses_short_names() {
        assert_eq!(
            "every".parse::<ReplayXpPolicy>().unwrap(),
            ReplayXpPolicy::AwardEveryAttempt
        );
        assert_eq!(
            "first".parse::<ReplayXpPolicy>().unwrap(),
            ReplayXpPolicy::FirstCompletionOnly
        );
        assert!("sometimes".parse::<ReplayXpPolicy>().is_err());
    }
}
