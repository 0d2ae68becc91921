use crate::model::Score;

/// Wire sentinel meaning "no correction to display".
pub const NO_CORRECTION: &str = "None needed";

/// Graded outcome for one answered round.
///
/// Ephemeral: held for display until the next question is requested, then
/// discarded with the round.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    score: Score,
    feedback: String,
    correction: Option<String>,
}

impl Evaluation {
    /// Builds an evaluation, normalizing the correction text.
    ///
    /// An absent, blank, or sentinel (`"None needed"`, compared trimmed and
    /// case-insensitively) correction becomes `None` so callers never render
    /// the sentinel as feedback.
    #[must_use]
    pub fn new(score: Score, feedback: impl Into<String>, correction: Option<String>) -> Self {
        Self {
            score,
            feedback: feedback.into(),
            correction: correction.and_then(normalize_correction),
        }
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    /// Correction to display, if the evaluator supplied one.
    #[must_use]
    pub fn correction(&self) -> Option<&str> {
        self.correction.as_deref()
    }
}

fn normalize_correction(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_CORRECTION) {
        None
    } else {
        Some(raw)
    }
}
