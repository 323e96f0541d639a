//! Progression engine: one learner, at most one quiz in flight.
//!
//! Every operation takes `&mut self`, so quiz input cannot interleave with an
//! outstanding commit. Dropping a commit future abandons the write.

use progression_core::model::{
    CompletionOutcome, Lesson, LessonId, NotificationKind, ReplayXpPolicy, Track, UserId,
    UserProgress,
};
use progression_core::{LevelProgress, QuizEvent, QuizResult, QuizSession, TrackLessons};

use crate::error::EngineError;
use crate::learner::{LearnerContext, LearnerSummary};
use crate::notification_service::NotificationService;
use crate::observer::{ProgressEvent, ProgressObserver};
use crate::progress_service::ProgressService;
use crate::sequencer_service::SequencerService;

/// What a successful commit persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitSummary {
    pub result: QuizResult,
    pub outcome: CompletionOutcome,
    pub level: LevelProgress,
}

struct ActiveQuiz {
    session: QuizSession,
    track_total: usize,
    pending: Option<QuizResult>,
    committed: Option<CommitSummary>,
}

pub struct ProgressionEngine {
    policy: ReplayXpPolicy,
    sequencer: SequencerService,
    progress: ProgressService,
    notifications: NotificationService,
    learner: LearnerContext,
    active: Option<ActiveQuiz>,
    observers: Vec<Box<dyn ProgressObserver>>,
}

impl ProgressionEngine {
    /// Load `user`'s progress and open a learner context.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::LoadFailure` if progress cannot be read.
    pub async fn sign_in(
        user: UserId,
        policy: ReplayXpPolicy,
        sequencer: SequencerService,
        progress: ProgressService,
        notifications: NotificationService,
    ) -> Result<Self, EngineError> {
        let loaded = progress.load(&user).await?;
        tracing::info!(
            user = %user,
            total_xp = loaded.total_xp(),
            level = loaded.level(),
            "learner signed in"
        );
        Ok(Self {
            policy,
            sequencer,
            progress,
            notifications,
            learner: LearnerContext::new(user, loaded),
            active: None,
            observers: Vec::new(),
        })
    }

    /// Close the learner context. Any unsaved quiz result is dropped.
    pub fn sign_out(mut self) -> UserId {
        if self.active.as_ref().is_some_and(|a| a.pending.is_some()) {
            tracing::warn!(user = %self.learner.user(), "signing out with an unsaved quiz result");
        }
        let user = self.learner.user().clone();
        self.publish(&ProgressEvent::SignedOut { user: user.clone() });
        tracing::info!(user = %user, "learner signed out");
        user
    }

    pub fn subscribe(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        self.learner.user()
    }

    #[must_use]
    pub fn progress(&self) -> &UserProgress {
        self.learner.progress()
    }

    #[must_use]
    pub fn summary(&self) -> LearnerSummary {
        self.learner.summary()
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&QuizSession> {
        self.active.as_ref().map(|a| &a.session)
    }

    /// Result of the finished quiz that still waits for `retry_commit`.
    #[must_use]
    pub fn pending_result(&self) -> Option<QuizResult> {
        self.active.as_ref().and_then(|a| a.pending)
    }

    /// Summary of the last successful commit for the current quiz.
    #[must_use]
    pub fn last_commit(&self) -> Option<&CommitSummary> {
        self.active.as_ref().and_then(|a| a.committed.as_ref())
    }

    /// Lessons of `track` with their unlock state for this learner.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::LoadFailure` if lessons cannot be loaded.
    pub async fn load_track(&mut self, track: &Track) -> Result<TrackLessons, EngineError> {
        let lessons = self
            .sequencer
            .load_track(track, self.learner.progress().completed_lessons())
            .await?;
        tracing::debug!(track = %track, lessons = lessons.len(), "track loaded");
        self.publish(&ProgressEvent::TrackLoaded {
            track: track.clone(),
            lessons: lessons.len(),
        });
        Ok(lessons)
    }

    /// Begin a quiz on an unlocked lesson, replacing any finished quiz.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::CommitPending` while a finished quiz is unsaved,
    /// `EngineError::LessonNotFound` or `EngineError::LessonLocked` for a lesson
    /// that cannot be played, and `EngineError::LoadFailure` on store errors.
    pub async fn start_lesson(&mut self, lesson_id: LessonId) -> Result<QuizEvent, EngineError> {
        if self.pending_result().is_some() {
            return Err(EngineError::CommitPending);
        }

        let lesson = self.sequencer.get_lesson(lesson_id).await?;
        let track = self
            .sequencer
            .load_track(lesson.track(), self.learner.progress().completed_lessons())
            .await?;
        let playable = track
            .find(lesson_id)
            .is_some_and(|(_, status)| status.is_playable());
        if !playable {
            return Err(EngineError::LessonLocked(lesson_id));
        }

        let track_total = track.len();
        Ok(self.begin(lesson, track_total))
    }

    fn begin(&mut self, lesson: Lesson, track_total: usize) -> QuizEvent {
        tracing::debug!(lesson = %lesson.id(), track = %lesson.track(), "quiz started");
        let session = QuizSession::start(lesson);
        let event = QuizEvent::QuestionPresented {
            question: 0,
            total: session.total_questions(),
        };
        self.active = Some(ActiveQuiz {
            session,
            track_total,
            pending: None,
            committed: None,
        });
        self.publish(&ProgressEvent::Quiz(event.clone()));
        event
    }

    /// # Errors
    ///
    /// Returns `EngineError::NoActiveQuiz` or `EngineError::Quiz` for a rejected
    /// selection.
    pub fn select_option(&mut self, option: usize) -> Result<QuizEvent, EngineError> {
        let active = self.active.as_mut().ok_or(EngineError::NoActiveQuiz)?;
        let event = active.session.select_option(option)?;
        self.publish(&ProgressEvent::Quiz(event.clone()));
        Ok(event)
    }

    /// Score the selected option.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Quiz(QuizError::NoSelection)` when nothing is
    /// selected; the session is left untouched.
    pub fn submit_answer(&mut self) -> Result<QuizEvent, EngineError> {
        let active = self.active.as_mut().ok_or(EngineError::NoActiveQuiz)?;
        let event = active.session.submit_answer()?;
        self.publish(&ProgressEvent::Quiz(event.clone()));
        Ok(event)
    }

    /// Move past the feedback. Finishing the last question commits progress.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Quiz` outside feedback and
    /// `EngineError::SaveFailure` if the commit fails. After a save failure
    /// the quiz stays finished and its result is kept for `retry_commit`.
    pub async fn advance(&mut self) -> Result<QuizEvent, EngineError> {
        let active = self.active.as_mut().ok_or(EngineError::NoActiveQuiz)?;
        let event = active.session.advance()?;
        if let QuizEvent::Finished(result) = &event {
            active.pending = Some(*result);
        }
        self.publish(&ProgressEvent::Quiz(event.clone()));

        if matches!(event, QuizEvent::Finished(_)) {
            self.commit().await?;
        }
        Ok(event)
    }

    /// Persist a finished quiz whose earlier commit failed.
    ///
    /// Returns the existing summary when the result is already saved.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NothingToCommit` if no quiz has finished and
    /// `EngineError::SaveFailure` if the write fails again.
    pub async fn retry_commit(&mut self) -> Result<CommitSummary, EngineError> {
        let active = self.active.as_ref().ok_or(EngineError::NoActiveQuiz)?;
        if let Some(summary) = &active.committed {
            return Ok(summary.clone());
        }
        self.commit().await
    }

    /// Start the current lesson over. Allowed from every state.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoActiveQuiz` if no quiz was started.
    pub fn restart(&mut self) -> Result<QuizEvent, EngineError> {
        let active = self.active.as_mut().ok_or(EngineError::NoActiveQuiz)?;
        if let Some(result) = active.pending.take() {
            tracing::warn!(lesson = %result.lesson_id, "discarding unsaved quiz result on restart");
        }
        active.committed = None;
        let event = active.session.restart();
        self.publish(&ProgressEvent::Quiz(event.clone()));
        Ok(event)
    }

    /// Leave the current quiz. Any unsaved result is dropped.
    pub fn abandon_quiz(&mut self) {
        if let Some(active) = self.active.take() {
            if let Some(result) = active.pending {
                tracing::warn!(lesson = %result.lesson_id, "abandoning unsaved quiz result");
            }
        }
    }

    async fn commit(&mut self) -> Result<CommitSummary, EngineError> {
        let active = self.active.as_ref().ok_or(EngineError::NoActiveQuiz)?;
        let result = active.pending.ok_or(EngineError::NothingToCommit)?;
        let lesson = active.session.lesson().clone();
        let track_total = active.track_total;

        let mut candidate = self.learner.progress().clone();
        let outcome = candidate.record_completion(&lesson, result.earned_xp, track_total, self.policy);

        if let Err(err) = self.progress.save(self.learner.user(), &candidate).await {
            tracing::warn!(
                user = %self.learner.user(),
                lesson = %lesson.id(),
                error = ?err,
                "progress commit failed"
            );
            self.publish(&ProgressEvent::CommitFailed {
                lesson_id: lesson.id(),
            });
            return Err(err);
        }

        let summary = CommitSummary {
            result,
            outcome,
            level: candidate.level_progress(),
        };
        self.learner.set_progress(candidate);
        if let Some(active) = self.active.as_mut() {
            active.pending = None;
            active.committed = Some(summary.clone());
        }
        tracing::info!(
            user = %self.learner.user(),
            lesson = %lesson.id(),
            xp_awarded = outcome.xp_awarded,
            total_xp = self.learner.progress().total_xp(),
            level = outcome.level_after,
            "progress committed"
        );

        self.notify_completion(&lesson, &summary).await;
        self.publish(&ProgressEvent::Committed(summary.clone()));
        Ok(summary)
    }

    async fn notify_completion(&self, lesson: &Lesson, summary: &CommitSummary) {
        let user = self.learner.user();
        if summary.result.is_perfect() {
            let message = format!(
                "You answered every question in \"{}\" correctly.",
                lesson.title()
            );
            self.notifications
                .emit(user, NotificationKind::Achievement, "Perfect score!", &message)
                .await;
        }
        if summary.outcome.newly_completed && summary.outcome.leveled_up() {
            let title = format!("Level {} reached", summary.outcome.level_after);
            let message = format!(
                "Completing \"{}\" brought you to {} XP.",
                lesson.title(),
                summary.level.total_xp
            );
            self.notifications
                .emit(user, NotificationKind::Lesson, &title, &message)
                .await;
        }
    }

    fn publish(&mut self, event: &ProgressEvent) {
        for observer in &mut self.observers {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use progression_core::QuizError;
    use progression_core::model::NotificationFilter;
    use progression_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    use crate::observer::RecordingObserver;

    async fn engine_with(repo: &InMemoryRepository, policy: ReplayXpPolicy) -> ProgressionEngine {
        ProgressionEngine::sign_in(
            UserId::new("learner").unwrap(),
            policy,
            SequencerService::new(Arc::new(repo.clone())),
            ProgressService::new(Arc::new(repo.clone())),
            NotificationService::new(fixed_clock(), Arc::new(repo.clone())),
        )
        .await
        .unwrap()
    }

    fn python() -> Track {
        Track::new("python").unwrap()
    }

    async fn answer_all_correctly(engine: &mut ProgressionEngine) -> QuizEvent {
        loop {
            let correct = engine
                .quiz()
                .and_then(|q| q.current_question())
                .map(|q| q.correct_option())
                .unwrap();
            engine.select_option(correct).unwrap();
            engine.submit_answer().unwrap();
            let event = engine.advance().await.unwrap();
            if matches!(event, QuizEvent::Finished(_)) {
                return event;
            }
        }
    }

    #[tokio::test]
    async fn finishing_a_lesson_commits_xp_and_unlocks_the_next() {
        let repo = InMemoryRepository::new();
        let mut engine = engine_with(&repo, ReplayXpPolicy::default()).await;
        let track = engine.load_track(&Track::new("javascript").unwrap()).await.unwrap();
        let first = track.lessons()[0].clone();
        let second = track.lessons()[1].id();

        assert!(matches!(
            engine.start_lesson(second).await,
            Err(EngineError::LessonLocked(_))
        ));

        engine.start_lesson(first.id()).await.unwrap();
        answer_all_correctly(&mut engine).await;

        let summary = engine.last_commit().unwrap().clone();
        assert_eq!(summary.outcome.xp_awarded, u64::from(first.xp_reward()));
        assert_eq!(engine.progress().total_xp(), u64::from(first.xp_reward()));
        assert!(engine.pending_result().is_none());

        engine.start_lesson(second).await.unwrap();
    }

    #[tokio::test]
    async fn submit_without_selection_changes_nothing() {
        let repo = InMemoryRepository::new();
        let mut engine = engine_with(&repo, ReplayXpPolicy::default()).await;
        let track = engine.load_track(&python()).await.unwrap();
        engine.start_lesson(track.lessons()[0].id()).await.unwrap();

        let before = engine.quiz().unwrap().clone();
        let err = engine.submit_answer().unwrap_err();
        assert!(matches!(err, EngineError::Quiz(QuizError::NoSelection)));
        assert_eq!(engine.quiz().unwrap(), &before);
    }

    #[tokio::test]
    async fn replaying_a_lesson_does_not_double_count() {
        let repo = InMemoryRepository::new();
        let mut engine = engine_with(&repo, ReplayXpPolicy::FirstCompletionOnly).await;
        let track = engine.load_track(&python()).await.unwrap();
        let lesson = track.lessons()[0].id();

        engine.start_lesson(lesson).await.unwrap();
        answer_all_correctly(&mut engine).await;
        let xp_after_first = engine.progress().total_xp();

        engine.restart().unwrap();
        answer_all_correctly(&mut engine).await;

        assert_eq!(engine.progress().total_xp(), xp_after_first);
        assert_eq!(engine.progress().track_progress(&python()).completed_count, 1);
        assert_eq!(engine.progress().completed_count(), 1);
    }

    #[tokio::test]
    async fn award_every_attempt_adds_xp_on_replay() {
        let repo = InMemoryRepository::new();
        let mut engine = engine_with(&repo, ReplayXpPolicy::AwardEveryAttempt).await;
        let track = engine.load_track(&python()).await.unwrap();
        let lesson = track.lessons()[0].clone();

        engine.start_lesson(lesson.id()).await.unwrap();
        answer_all_correctly(&mut engine).await;
        engine.restart().unwrap();
        answer_all_correctly(&mut engine).await;

        assert_eq!(engine.progress().total_xp(), 2 * u64::from(lesson.xp_reward()));
        assert_eq!(engine.progress().track_progress(&python()).completed_count, 1);
    }

    #[tokio::test]
    async fn perfect_score_emits_achievement() {
        let repo = InMemoryRepository::new();
        let mut engine = engine_with(&repo, ReplayXpPolicy::default()).await;
        let track = engine.load_track(&python()).await.unwrap();
        engine.start_lesson(track.lessons()[0].id()).await.unwrap();
        answer_all_correctly(&mut engine).await;

        let user = engine.user().clone();
        let items = engine
            .notifications()
            .list(&user, NotificationFilter::All, 10)
            .await
            .unwrap();
        assert!(items.iter().any(|n| n.kind == NotificationKind::Achievement));
    }

    #[tokio::test]
    async fn observers_see_quiz_and_commit_events() {
        let repo = InMemoryRepository::new();
        let mut engine = engine_with(&repo, ReplayXpPolicy::default()).await;
        let recorder = RecordingObserver::new();
        engine.subscribe(Box::new(recorder.clone()));

        let track = engine.load_track(&python()).await.unwrap();
        engine.start_lesson(track.lessons()[0].id()).await.unwrap();
        answer_all_correctly(&mut engine).await;

        let events = recorder.events();
        assert!(matches!(events[0], ProgressEvent::TrackLoaded { .. }));
        assert!(matches!(
            events[1],
            ProgressEvent::Quiz(QuizEvent::QuestionPresented { question: 0, .. })
        ));
        assert!(matches!(events.last(), Some(ProgressEvent::Committed(_))));
    }

    #[tokio::test]
    async fn restart_from_finished_resets_the_session() {
        let repo = InMemoryRepository::new();
        let mut engine = engine_with(&repo, ReplayXpPolicy::default()).await;
        let track = engine.load_track(&python()).await.unwrap();
        engine.start_lesson(track.lessons()[0].id()).await.unwrap();
        answer_all_correctly(&mut engine).await;

        let event = engine.restart().unwrap();
        let quiz = engine.quiz().unwrap();
        assert!(matches!(event, QuizEvent::QuestionPresented { question: 0, .. }));
        assert_eq!(quiz.correct_count(), 0);
        assert_eq!(quiz.cumulative_score(), 0);
        assert!(engine.last_commit().is_none());
    }

    #[tokio::test]
    async fn abandoning_leaves_no_quiz_behind() {
        let repo = InMemoryRepository::new();
        let mut engine = engine_with(&repo, ReplayXpPolicy::default()).await;
        let track = engine.load_track(&python()).await.unwrap();
        engine.start_lesson(track.lessons()[0].id()).await.unwrap();
        engine.select_option(0).unwrap();

        engine.abandon_quiz();

        assert!(engine.quiz().is_none());
        assert!(engine.pending_result().is_none());
        assert!(matches!(engine.submit_answer(), Err(EngineError::NoActiveQuiz)));
        assert_eq!(engine.progress().total_xp(), 0);
    }

    #[tokio::test]
    async fn quiz_actions_need_an_active_quiz() {
        let repo = InMemoryRepository::new();
        let mut engine = engine_with(&repo, ReplayXpPolicy::default()).await;
        assert!(matches!(engine.select_option(0), Err(EngineError::NoActiveQuiz)));
        assert!(matches!(engine.restart(), Err(EngineError::NoActiveQuiz)));
        assert!(matches!(
            engine.retry_commit().await,
            Err(EngineError::NoActiveQuiz)
        ));
    }
}
