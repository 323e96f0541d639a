//! Built-in starter lessons used to seed an empty track.

use crate::model::{LessonDraft, LessonError, Question, QuestionError, Track};

struct QuestionTemplate {
    prompt: &'static str,
    options: &'static [&'static str],
    correct: usize,
    explanation: &'static str,
}

struct LessonTemplate {
    order: u32,
    title: &'static str,
    description: &'static str,
    xp_reward: u32,
    questions: &'static [QuestionTemplate],
}

const JAVASCRIPT: &[LessonTemplate] = &[
    LessonTemplate {
        order: 1,
        title: "Introduction to JavaScript",
        description: "Learn the basic concepts of the JavaScript language",
        xp_reward: 50,
        questions: &[
            QuestionTemplate {
                prompt: "What is JavaScript?",
                options: &[
                    "A programming language for the web",
                    "A CSS framework",
                    "A database",
                    "A text editor",
                ],
                correct: 0,
                explanation: "JavaScript is a programming language mainly used for web development.",
            },
            QuestionTemplate {
                prompt: "How do you declare a variable in JavaScript?",
                options: &["let name", "variable name", "declare name", "name = variable"],
                correct: 0,
                explanation: "Use `var`, `let` or `const` to declare variables in JavaScript.",
            },
        ],
    },
    LessonTemplate {
        order: 2,
        title: "Variables and Data Types",
        description: "Understand how to work with variables and different data types",
        xp_reward: 60,
        questions: &[QuestionTemplate {
            prompt: "What is the data type of \"Hello World\"?",
            options: &["string", "number", "boolean", "object"],
            correct: 0,
            explanation: "Text between quotes is a string in JavaScript.",
        }],
    },
];

const PYTHON: &[LessonTemplate] = &[LessonTemplate {
    order: 1,
    title: "Introduction to Python",
    description: "First steps with the Python language",
    xp_reward: 50,
    questions: &[QuestionTemplate {
        prompt: "How do you print \"Hello World\" in Python?",
        options: &[
            "print(\"Hello World\")",
            "console.log(\"Hello World\")",
            "echo \"Hello World\"",
            "printf(\"Hello World\")",
        ],
        correct: 0,
        explanation: "Python uses print() to write text to the screen.",
    }],
}];

const HTML: &[LessonTemplate] = &[LessonTemplate {
    order: 1,
    title: "Basic HTML Structure",
    description: "Learn the fundamental structure of an HTML document",
    xp_reward: 40,
    questions: &[QuestionTemplate {
        prompt: "Which tag defines the title of an HTML page?",
        options: &["<title>", "<header>", "<h1>", "<head>"],
        correct: 0,
        explanation: "The <title> tag sets the text shown in the browser tab.",
    }],
}];

/// Tracks that ship with starter content.
pub const SEEDED_TRACKS: &[&str] = &["javascript", "python", "html"];

fn templates_for(track: &Track) -> &'static [LessonTemplate] {
    match track.as_str() {
        "javascript" => JAVASCRIPT,
        "python" => PYTHON,
        "html" => HTML,
        _ => &[],
    }
}

fn build_question(t: &QuestionTemplate) -> Result<Question, QuestionError> {
    Question::new(
        t.prompt,
        t.options.iter().map(|o| (*o).to_string()).collect(),
        t.correct,
        t.explanation,
    )
}

/// Starter lessons for `track`, empty for tracks without built-in content.
///
/// # Errors
///
/// Returns `LessonError` if a template violates lesson invariants.
pub fn default_lessons(track: &Track) -> Result<Vec<LessonDraft>, LessonError> {
    templates_for(track)
        .iter()
        .map(|t| {
            let questions = t
                .questions
                .iter()
                .enumerate()
                .map(|(index, q)| {
                    build_question(q).map_err(|source| LessonError::Question { index, source })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let draft = LessonDraft {
                track: track.clone(),
                order: t.order,
                title: t.title.to_string(),
                description: t.description.to_string(),
                xp_reward: t.xp_reward,
                questions,
            };
            draft.clone().validate()?;
            Ok(draft)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_seeded_track_has_valid_lessons() {
        for name in SEEDED_TRACKS {
            let track = Track::new(*name).unwrap();
            let lessons = default_lessons(&track).unwrap();
            assert!(!lessons.is_empty(), "{name} has no lessons");
            for (i, lesson) in lessons.iter().enumerate() {
                assert_eq!(lesson.order, u32::try_from(i).unwrap() + 1);
                assert_eq!(&lesson.track, &track);
            }
        }
    }

    #[test]
    fn javascript_starter_content() {
        let lessons = default_lessons(&Track::new("javascript").unwrap()).unwrap();
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].xp_reward, 50);
        assert_eq!(lessons[0].questions.len(), 2);
        assert_eq!(lessons[1].xp_reward, 60);
    }

    #[test]
    fn unknown_track_has_no_templates() {
        assert!(default_lessons(&Track::new("cobol").unwrap()).unwrap().is_empty());
    }
}
