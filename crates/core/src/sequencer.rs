//! Linear unlock order over the lessons of a track.
//!
//! Lesson 0 is always open; any later lesson opens only once the lesson right
//! before it is complete. Nothing is ever skipped.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{Lesson, LessonId};

/// Gate state of one lesson for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    Completed,
    Unlocked,
    Locked,
}

impl LessonStatus {
    #[must_use]
    pub fn is_playable(self) -> bool {
        !matches!(self, LessonStatus::Locked)
    }
}

/// Sort lessons by their track order. Stable, so equal orders keep input order.
pub fn sort_by_order(lessons: &mut [Lesson]) {
    lessons.sort_by_key(Lesson::order);
}

#[must_use]
pub fn is_completed(lesson: &Lesson, completed: &BTreeSet<LessonId>) -> bool {
    completed.contains(&lesson.id())
}

/// Whether the lesson at `index` may be started. Expects `lessons` sorted by order.
#[must_use]
pub fn is_unlocked(lessons: &[Lesson], index: usize, completed: &BTreeSet<LessonId>) -> bool {
    if index >= lessons.len() {
        return false;
    }
    if index == 0 {
        return true;
    }
    is_completed(&lessons[index - 1], completed)
}

#[must_use]
pub fn status_at(lessons: &[Lesson], index: usize, completed: &BTreeSet<LessonId>) -> LessonStatus {
    match lessons.get(index) {
        Some(lesson) if is_completed(lesson, completed) => LessonStatus::Completed,
        Some(_) if is_unlocked(lessons, index, completed) => LessonStatus::Unlocked,
        _ => LessonStatus::Locked,
    }
}

/// A track's lessons in order, each paired with its gate state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackLessons {
    lessons: Vec<Lesson>,
    statuses: Vec<LessonStatus>,
}

impl TrackLessons {
    /// Sort `lessons` by order and evaluate every gate against `completed`.
    #[must_use]
    pub fn evaluate(mut lessons: Vec<Lesson>, completed: &BTreeSet<LessonId>) -> Self {
        sort_by_order(&mut lessons);
        let statuses = (0..lessons.len())
            .map(|i| status_at(&lessons, i, completed))
            .collect();
        Self { lessons, statuses }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Lesson, LessonStatus)> {
        self.lessons.iter().zip(self.statuses.iter().copied())
    }

    #[must_use]
    pub fn find(&self, id: LessonId) -> Option<(&Lesson, LessonStatus)> {
        self.iter().find(|(lesson, _)| lesson.id() == id)
    }

    /// First lesson that is open but not yet complete.
    #[must_use]
    pub fn next_playable(&self) -> Option<&Lesson> {
        self.iter()
            .find(|(_, status)| *status == LessonStatus::Unlocked)
            .map(|(lesson, _)| lesson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LessonDraft, Question, Track};

    fn lesson(id: u64, order: u32) -> Lesson {
        let q = Question::new("Q", vec!["a".into(), "b".into()], 1, "").unwrap();
        Lesson::from_persisted(
            LessonId::new(id),
            LessonDraft {
                track: Track::new("javascript").unwrap(),
                order,
                title: format!("L{order}"),
                description: String::new(),
                xp_reward: 10,
                questions: vec![q],
            },
        )
        .unwrap()
    }

    fn three() -> Vec<Lesson> {
        vec![lesson(10, 1), lesson(20, 2), lesson(30, 3)]
    }

    #[test]
    fn only_first_lesson_is_open_initially() {
        let lessons = three();
        let completed = BTreeSet::new();
        assert!(is_unlocked(&lessons, 0, &completed));
        assert!(!is_unlocked(&lessons, 1, &completed));
        assert!(!is_unlocked(&lessons, 2, &completed));
    }

    #[test]
    fn completing_a_lesson_opens_only_the_next() {
        let lessons = three();
        let completed: BTreeSet<_> = [LessonId::new(10)].into_iter().collect();
        assert!(is_unlocked(&lessons, 1, &completed));
        assert!(!is_unlocked(&lessons, 2, &completed));
        assert_eq!(status_at(&lessons, 0, &completed), LessonStatus::Completed);
        assert_eq!(status_at(&lessons, 1, &completed), LessonStatus::Unlocked);
        assert_eq!(status_at(&lessons, 2, &completed), LessonStatus::Locked);
    }

    #[test]
    fn completion_out_of_order_does_not_skip() {
        let lessons = three();
        let completed: BTreeSet<_> = [LessonId::new(30)].into_iter().collect();
        assert_eq!(status_at(&lessons, 1, &completed), LessonStatus::Locked);
        // Completed stays visible even when its predecessor is open.
        assert_eq!(status_at(&lessons, 2, &completed), LessonStatus::Completed);
    }

    #[test]
    fn out_of_range_index_is_locked() {
        assert!(!is_unlocked(&three(), 3, &BTreeSet::new()));
        assert!(!is_unlocked(&[], 0, &BTreeSet::new()));
    }

    #[test]
    fn evaluate_resorts_unsorted_input() {
        let shuffled = vec![lesson(30, 3), lesson(10, 1), lesson(20, 2)];
        let track = TrackLessons::evaluate(shuffled, &BTreeSet::new());
        let orders: Vec<u32> = track.lessons().iter().map(Lesson::order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(track.next_playable().map(Lesson::id), Some(LessonId::new(10)));
    }

    #[test]
    fn next_playable_follows_completion() {
        let completed: BTreeSet<_> = [LessonId::new(10), LessonId::new(20)].into_iter().collect();
        let track = TrackLessons::evaluate(three(), &completed);
        assert_eq!(track.next_playable().map(Lesson::id), Some(LessonId::new(30)));
        assert_eq!(
            track.find(LessonId::new(20)).map(|(_, s)| s),
            Some(LessonStatus::Completed)
        );

        let all: BTreeSet<_> = three().iter().map(Lesson::id).collect();
        assert!(TrackLessons::evaluate(three(), &all).next_playable().is_none());
    }
}
