//! Contracts for the session's external collaborators.
//!
//! The controller sequences calls against these traits and nothing else, so
//! each collaborator can be mocked independently in tests. The mastery store
//! contract lives in the `storage` crate.

use async_trait::async_trait;

use crate::error::{EvaluatorError, ProviderError};
use tutor_core::model::{Evaluation, LearnerId, Level, Mastery, Question, TopicId};

/// A question plus the provider-chosen difficulty label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuestion {
    pub question: Question,
    pub level: Level,
}

/// Everything the evaluator needs to grade one answer.
#[derive(Debug, Clone)]
pub struct AnswerSubmission<'a> {
    pub question: &'a str,
    pub answer: &'a str,
    pub correct_answer: &'a str,
    /// Human-readable topic title, as shown to the learner.
    pub topic: &'a str,
    pub learner: &'a LearnerId,
    pub topic_id: &'a TopicId,
    pub mastery: Mastery,
}

/// Graded evaluation plus the evaluator's updated mastery.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedAnswer {
    pub evaluation: Evaluation,
    pub new_mastery: Mastery,
}

/// Generates one question appropriate to the given mastery.
///
/// The difficulty label and its thresholds are the provider's policy; the
/// controller displays the label and never interprets it.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Requests one question for `topic` at the given mastery.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on transport failure, a declined request, or a
    /// response violating the question contract. The controller reports the
    /// failure and stays in its prior state; there is no automatic retry.
    async fn generate_question(
        &self,
        topic: &str,
        mastery: Mastery,
    ) -> Result<GeneratedQuestion, ProviderError>;
}

/// Grades an answer and proposes an updated mastery.
///
/// The scoring and mastery-update formula is entirely owned by the
/// implementor; the controller absorbs `new_mastery` without recomputation.
#[async_trait]
pub trait AnswerEvaluator: Send + Sync {
    /// Submits one answer for grading.
    ///
    /// # Errors
    ///
    /// Returns `EvaluatorError` on transport failure or a declined request.
    /// The controller leaves mastery and counters untouched on failure, so
    /// retrying the same submission is idempotent.
    async fn evaluate(&self, submission: AnswerSubmission<'_>)
    -> Result<GradedAnswer, EvaluatorError>;
}

/// Callback invoked exactly once per session, with the final mastery, when
/// the session reaches its terminal state.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn on_complete(&self, final_mastery: Mastery);
}
