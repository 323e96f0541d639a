use thiserror::Error;

use crate::model::ids::LessonId;
use crate::model::track::Track;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("a question needs at least 2 options, got {count}")]
    TooFewOptions { count: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("correct option {index} is out of range for {len} options")]
    CorrectOptionOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("lesson order must be >= 1")]
    InvalidOrder,

    #[error("lesson must contain at least one question")]
    NoQuestions,

    #[error("invalid question {index}: {source}")]
    Question {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Multiple-choice question. The correct option always indexes into `options`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct_option: usize,
    explanation: String,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, fewer than two options are
    /// given, an option is blank, or `correct_option` does not index an option.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: options.len(),
            });
        }
        if let Some(index) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index });
        }
        if correct_option >= options.len() {
            return Err(QuestionError::CorrectOptionOutOfRange {
                index: correct_option,
                len: options.len(),
            });
        }

        Ok(Self {
            prompt,
            options,
            correct_option,
            explanation: explanation.into(),
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_option
    }
}

//
// ─── LESSON TYPES ──────────────────────────────────────────────────────────────
//

/// Lesson content before storage has assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDraft {
    pub track: Track,
    pub order: u32,
    pub title: String,
    pub description: String,
    pub xp_reward: u32,
    pub questions: Vec<Question>,
}

impl LessonDraft {
    /// Validate lesson-level invariants.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` for a blank title, an order of zero, or an empty
    /// question list.
    pub fn validate(self) -> Result<ValidatedLesson, LessonError> {
        if self.title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        if self.order == 0 {
            return Err(LessonError::InvalidOrder);
        }
        if self.questions.is_empty() {
            return Err(LessonError::NoQuestions);
        }

        Ok(ValidatedLesson {
            track: self.track,
            order: self.order,
            title: self.title.trim().to_string(),
            description: self.description,
            xp_reward: self.xp_reward,
            questions: self.questions,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLesson {
    track: Track,
    order: u32,
    title: String,
    description: String,
    xp_reward: u32,
    questions: Vec<Question>,
}

impl ValidatedLesson {
    #[must_use]
    pub fn track(&self) -> &Track {
        &self.track
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn assign_id(self, id: LessonId) -> Lesson {
        Lesson {
            id,
            track: self.track,
            order: self.order,
            title: self.title,
            description: self.description,
            xp_reward: self.xp_reward,
            questions: self.questions,
        }
    }
}

/// Immutable lesson as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    track: Track,
    order: u32,
    title: String,
    description: String,
    xp_reward: u32,
    questions: Vec<Question>,
}

impl Lesson {
    /// Rehydrate a lesson from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the stored content violates lesson invariants.
    pub fn from_persisted(id: LessonId, draft: LessonDraft) -> Result<Self, LessonError> {
        Ok(draft.validate()?.assign_id(id))
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn track(&self) -> &Track {
        &self.track
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn xp_reward(&self) -> u32 {
        self.xp_reward
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions; never zero for a validated lesson.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
