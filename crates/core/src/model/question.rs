use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Violations of the question-provider contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("question has no answer options")]
    NoOptions,

    #[error("correct answer is not among the options")]
    CorrectAnswerMissing,

    #[error("correct answer appears {count} times in the options")]
    AmbiguousCorrectAnswer { count: usize },
}

//
// ─── LEVEL ────────────────────────────────────────────────────────────────────
//

/// Difficulty label chosen by the question provider.
///
/// Opaque to the core: displayed as-is, never parsed or compared against
/// thresholds. The policy mapping mastery to a label lives with the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level(String);

impl Level {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question, one per round.
///
/// Option order is preserved for display. The constructor is the only way to
/// build a question, so a held `Question` always satisfies the provider
/// contract: at least one option, and the correct answer present exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
}

impl Question {
    /// Validates and builds a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, there are no options,
    /// or `correct_answer` does not appear in `options` exactly once.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        let correct_answer = correct_answer.into();

        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }

        let count = options.iter().filter(|o| **o == correct_answer).count();
        match count {
            0 => Err(QuestionError::CorrectAnswerMissing),
            1 => Ok(Self {
                prompt,
                options,
                correct_answer,
            }),
            count => Err(QuestionError::AmbiguousCorrectAnswer { count }),
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Candidate answers in display order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Whether `choice` is one of the offered options.
    #[must_use]
    pub fn offers(&self, choice: &str) -> bool {
        self.options.iter().any(|o| o == choice)
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
