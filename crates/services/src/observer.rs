//! Progress observers.
//!
//! The engine pushes a [`ProgressEvent`] after every state change so a
//! rendering layer can redraw without polling.

use std::sync::{Arc, Mutex};

use progression_core::QuizEvent;
use progression_core::model::{LessonId, Track, UserId};

use crate::engine::CommitSummary;

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    TrackLoaded { track: Track, lessons: usize },
    Quiz(QuizEvent),
    Committed(CommitSummary),
    CommitFailed { lesson_id: LessonId },
    SignedOut { user: UserId },
}

/// Receives engine events.
pub trait ProgressObserver: Send {
    fn on_event(&mut self, event: &ProgressEvent);
}

/// Stores events in a shared buffer; clones see the same buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Drain the buffer.
    pub fn take_events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_event(&mut self, event: &ProgressEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_observer_shares_its_buffer() {
        let recorder = RecordingObserver::new();
        let mut handle = recorder.clone();
        handle.on_event(&ProgressEvent::CommitFailed {
            lesson_id: LessonId::new(3),
        });

        assert_eq!(recorder.events().len(), 1);
        assert_eq!(recorder.take_events().len(), 1);
        assert!(recorder.events().is_empty());
    }
}
