//! Quiz session state machine for a single lesson attempt.
//!
//! ```text
//! Presenting(i) -> AnswerSelected(i, opt) -> Feedback(i, correct) -> Presenting(i + 1)
//!                                                                 \-> Finished
//! ```
//!
//! Every transition returns a [`QuizEvent`] describing what changed, so a
//! renderer can react without the session knowing about it.

use serde::Serialize;
use thiserror::Error;

use crate::model::{Lesson, LessonId, Question};

/// Points added to the session score for each correct answer.
pub const POINTS_PER_CORRECT_ANSWER: u32 = 10;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no option selected")]
    NoSelection,

    #[error("option {option} does not exist, question has {len} options")]
    OptionOutOfRange { option: usize, len: usize },

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: QuizState,
    },
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuizState {
    Presenting { question: usize },
    AnswerSelected { question: usize, option: usize },
    Feedback { question: usize, correct: bool },
    Finished,
}

impl std::fmt::Display for QuizState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizState::Presenting { question } => write!(f, "presenting question {question}"),
            QuizState::AnswerSelected { question, option } => {
                write!(f, "option {option} selected on question {question}")
            }
            QuizState::Feedback { question, .. } => {
                write!(f, "showing feedback for question {question}")
            }
            QuizState::Finished => f.write_str("finished"),
        }
    }
}

/// What the learner sees after submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    pub question: usize,
    pub correct: bool,
    pub correct_option: usize,
    /// The learner's option, only when it was wrong.
    pub wrong_option: Option<usize>,
    pub explanation: String,
    pub is_last_question: bool,
}

/// Outcome of a finished attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    pub lesson_id: LessonId,
    pub correct_count: u32,
    pub total_questions: u32,
    pub cumulative_score: u32,
    pub earned_xp: u64,
}

impl QuizResult {
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.correct_count == self.total_questions
    }
}

/// Earned XP for `correct` of `total` answers: the reward scaled down and floored.
#[must_use]
pub fn earned_xp(correct: u32, total: u32, xp_reward: u32) -> u64 {
    if total == 0 {
        return 0;
    }
    u64::from(correct.min(total)) * u64::from(xp_reward) / u64::from(total)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QuizEvent {
    QuestionPresented { question: usize, total: usize },
    OptionSelected { question: usize, option: usize },
    AnswerRevealed(AnswerFeedback),
    Finished(QuizResult),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Transient state of one lesson attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    lesson: Lesson,
    state: QuizState,
    correct_count: u32,
    cumulative_score: u32,
}

impl QuizSession {
    /// Begin an attempt on `lesson` at its first question.
    #[must_use]
    pub fn start(lesson: Lesson) -> Self {
        Self {
            lesson,
            state: QuizState::Presenting { question: 0 },
            correct_count: 0,
            cumulative_score: 0,
        }
    }

    /// Throw away the attempt and start over on the same lesson. Always allowed.
    pub fn restart(&mut self) -> QuizEvent {
        self.state = QuizState::Presenting { question: 0 };
        self.correct_count = 0;
        self.cumulative_score = 0;
        self.presented(0)
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn state(&self) -> QuizState {
        self.state
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn cumulative_score(&self) -> u32 {
        self.cumulative_score
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.lesson.question_count()
    }

    /// Index of the question on screen, `None` once finished.
    #[must_use]
    pub fn current_question_index(&self) -> Option<usize> {
        match self.state {
            QuizState::Presenting { question }
            | QuizState::AnswerSelected { question, .. }
            | QuizState::Feedback { question, .. } => Some(question),
            QuizState::Finished => None,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current_question_index()
            .and_then(|i| self.lesson.questions().get(i))
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        match self.state {
            QuizState::AnswerSelected { option, .. } => Some(option),
            _ => None,
        }
    }

    /// Submission is only possible once an option is picked.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        matches!(self.state, QuizState::AnswerSelected { .. })
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, QuizState::Finished)
    }

    /// Pick an option on the current question. Re-selecting before submission
    /// replaces the previous choice.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::OptionOutOfRange` for an unknown option and
    /// `QuizError::InvalidTransition` outside of answering.
    pub fn select_option(&mut self, option: usize) -> Result<QuizEvent, QuizError> {
        let question = match self.state {
            QuizState::Presenting { question } | QuizState::AnswerSelected { question, .. } => {
                question
            }
            state => {
                return Err(QuizError::InvalidTransition {
                    action: "select an option",
                    state,
                });
            }
        };

        let len = self.lesson.questions()[question].options().len();
        if option >= len {
            return Err(QuizError::OptionOutOfRange { option, len });
        }

        self.state = QuizState::AnswerSelected { question, option };
        Ok(QuizEvent::OptionSelected { question, option })
    }

    /// Score the selected option and reveal the answer.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoSelection` when nothing is selected yet and
    /// `QuizError::InvalidTransition` when feedback is already showing or the
    /// quiz is over. No state changes on error.
    pub fn submit_answer(&mut self) -> Result<QuizEvent, QuizError> {
        let (question, option) = match self.state {
            QuizState::AnswerSelected { question, option } => (question, option),
            QuizState::Presenting { .. } => return Err(QuizError::NoSelection),
            state => {
                return Err(QuizError::InvalidTransition {
                    action: "submit an answer",
                    state,
                });
            }
        };

        let q = &self.lesson.questions()[question];
        let correct = q.is_correct(option);
        if correct {
            self.correct_count = self.correct_count.saturating_add(1);
            self.cumulative_score = self
                .cumulative_score
                .saturating_add(POINTS_PER_CORRECT_ANSWER);
        }

        let feedback = AnswerFeedback {
            question,
            correct,
            correct_option: q.correct_option(),
            wrong_option: (!correct).then_some(option),
            explanation: q.explanation().to_string(),
            is_last_question: question + 1 >= self.total_questions(),
        };
        self.state = QuizState::Feedback { question, correct };
        Ok(QuizEvent::AnswerRevealed(feedback))
    }

    /// Leave the feedback screen for the next question, or finish.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidTransition` unless feedback is showing.
    pub fn advance(&mut self) -> Result<QuizEvent, QuizError> {
        let QuizState::Feedback { question, .. } = self.state else {
            return Err(QuizError::InvalidTransition {
                action: "advance",
                state: self.state,
            });
        };

        let next = question + 1;
        if next < self.total_questions() {
            self.state = QuizState::Presenting { question: next };
            return Ok(self.presented(next));
        }

        self.state = QuizState::Finished;
        let result = self.build_result();
        Ok(QuizEvent::Finished(result))
    }

    /// Final result, available once finished.
    #[must_use]
    pub fn result(&self) -> Option<QuizResult> {
        self.is_finished().then(|| self.build_result())
    }

    fn build_result(&self) -> QuizResult {
        let total = u32::try_from(self.total_questions()).unwrap_or(u32::MAX);
        QuizResult {
            lesson_id: self.lesson.id(),
            correct_count: self.correct_count,
            total_questions: total,
            cumulative_score: self.cumulative_score,
            earned_xp: earned_xp(self.correct_count, total, self.lesson.xp_reward()),
        }
    }

    fn presented(&self, question: usize) -> QuizEvent {
        QuizEvent::QuestionPresented {
            question,
            total: self.total_questions(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LessonDraft, Track};

    fn lesson(questions: usize, xp_reward: u32) -> Lesson {
        let qs = (0..questions)
            .map(|i| {
                Question::new(
                    format!("Q{i}"),
                    vec!["right".into(), "wrong".into(), "also wrong".into()],
                    0,
                    format!("because {i}"),
                )
                .unwrap()
            })
            .collect();
        Lesson::from_persisted(
            LessonId::new(1),
            LessonDraft {
                track: Track::new("javascript").unwrap(),
                order: 1,
                title: "Quiz".into(),
                description: String::new(),
                xp_reward,
                questions: qs,
            },
        )
        .unwrap()
    }

    fn answer(session: &mut QuizSession, option: usize) -> QuizEvent {
        session.select_option(option).unwrap();
        let revealed = session.submit_answer().unwrap();
        session.advance().unwrap();
        revealed
    }

    #[test]
    fn all_correct_earns_full_reward() {
        let mut session = QuizSession::start(lesson(2, 50));
        answer(&mut session, 0);
        answer(&mut session, 0);

        let result = session.result().unwrap();
        assert_eq!(result.earned_xp, 50);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.cumulative_score, 20);
        assert!(result.is_perfect());
    }

    #[test]
    fn partial_score_is_floored() {
        let mut session = QuizSession::start(lesson(3, 60));
        answer(&mut session, 0);
        answer(&mut session, 1);
        answer(&mut session, 2);

        let result = session.result().unwrap();
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.earned_xp, 20);
        assert_eq!(result.cumulative_score, 10);
        assert!(!result.is_perfect());
    }

    #[test]
    fn half_of_fifty_is_twenty_five() {
        assert_eq!(earned_xp(1, 2, 50), 25);
        assert_eq!(earned_xp(2, 3, 50), 33);
        assert_eq!(earned_xp(0, 0, 50), 0);
    }

    #[test]
    fn submit_without_selection_is_rejected() {
        let mut session = QuizSession::start(lesson(2, 50));
        assert!(!session.can_submit());
        assert_eq!(session.submit_answer().unwrap_err(), QuizError::NoSelection);
        assert_eq!(session.state(), QuizState::Presenting { question: 0 });
        assert_eq!(session.correct_count(), 0);
    }

    #[test]
    fn reselecting_overwrites_choice() {
        let mut session = QuizSession::start(lesson(1, 10));
        session.select_option(1).unwrap();
        session.select_option(0).unwrap();
        assert_eq!(session.selected_option(), Some(0));

        let QuizEvent::AnswerRevealed(feedback) = session.submit_answer().unwrap() else {
            panic!("expected feedback");
        };
        assert!(feedback.correct);
        assert_eq!(feedback.wrong_option, None);
    }

    #[test]
    fn wrong_answer_feedback_marks_both_options() {
        let mut session = QuizSession::start(lesson(2, 10));
        session.select_option(2).unwrap();
        let QuizEvent::AnswerRevealed(feedback) = session.submit_answer().unwrap() else {
            panic!("expected feedback");
        };
        assert!(!feedback.correct);
        assert_eq!(feedback.correct_option, 0);
        assert_eq!(feedback.wrong_option, Some(2));
        assert_eq!(feedback.explanation, "because 0");
        assert!(!feedback.is_last_question);
    }

    #[test]
    fn selection_is_locked_during_feedback() {
        let mut session = QuizSession::start(lesson(2, 10));
        session.select_option(0).unwrap();
        session.submit_answer().unwrap();

        assert!(matches!(
            session.select_option(1),
            Err(QuizError::InvalidTransition { .. })
        ));
        assert!(matches!(
            session.submit_answer(),
            Err(QuizError::InvalidTransition { .. })
        ));
        assert_eq!(session.correct_count(), 1);
    }

    #[test]
    fn advance_requires_feedback() {
        let mut session = QuizSession::start(lesson(2, 10));
        assert!(session.advance().is_err());
        session.select_option(0).unwrap();
        assert!(session.advance().is_err());
    }

    #[test]
    fn advance_resets_selection_for_next_question() {
        let mut session = QuizSession::start(lesson(2, 10));
        session.select_option(1).unwrap();
        session.submit_answer().unwrap();
        let event = session.advance().unwrap();

        assert_eq!(event, QuizEvent::QuestionPresented { question: 1, total: 2 });
        assert_eq!(session.selected_option(), None);
        assert!(!session.can_submit());
    }

    #[test]
    fn option_out_of_range_is_rejected() {
        let mut session = QuizSession::start(lesson(1, 10));
        assert_eq!(
            session.select_option(3).unwrap_err(),
            QuizError::OptionOutOfRange { option: 3, len: 3 }
        );
    }

    #[test]
    fn restart_from_finished_resets_counters() {
        let mut session = QuizSession::start(lesson(1, 10));
        answer(&mut session, 0);
        assert!(session.is_finished());
        assert!(session.select_option(0).is_err());

        let event = session.restart();

        assert_eq!(event, QuizEvent::QuestionPresented { question: 0, total: 1 });
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.cumulative_score(), 0);
        assert_eq!(session.current_question_index(), Some(0));
        assert!(session.result().is_none());
    }

    #[test]
    fn finished_event_carries_result() {
        let mut session = QuizSession::start(lesson(1, 40));
        session.select_option(0).unwrap();
        session.submit_answer().unwrap();
        match session.advance().unwrap() {
            QuizEvent::Finished(result) => assert_eq!(result.earned_xp, 40),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(session.current_question_index(), None);
    }
}
