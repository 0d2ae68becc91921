use std::sync::Arc;

use tracing::{debug, warn};

use storage::repository::MasteryStore;
use tutor_core::Clock;
use tutor_core::model::{Evaluation, LearnerId, Mastery, SessionStatus, SessionSummary, TopicId};

use super::progress::SessionProgress;
use super::session::AssessmentSession;
use crate::collaborators::{AnswerEvaluator, AnswerSubmission, CompletionSink, QuestionProvider};
use crate::error::SessionError;

/// Result of submitting one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub evaluation: Evaluation,
    pub mastery: Mastery,
    pub progress: SessionProgress,
}

/// Result of an `advance` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The next question is installed and the session awaits an answer.
    NextQuestion,
    /// The round limit was reached; the sink has been invoked.
    Completed(SessionSummary),
    /// The session was not ready to advance; nothing changed.
    Unchanged,
}

/// Orchestrates one assessment session against its collaborators.
///
/// Owns the sequencing only: mastery comes from the store once, every
/// mastery mutation afterwards comes from the evaluator, and the completion
/// sink fires exactly once. Each suspending operation takes the session by
/// `&mut`, so a second operation cannot start while one is in flight.
#[derive(Clone)]
pub struct SessionRunner {
    clock: Clock,
    store: Arc<dyn MasteryStore>,
    provider: Arc<dyn QuestionProvider>,
    evaluator: Arc<dyn AnswerEvaluator>,
    sink: Arc<dyn CompletionSink>,
}

impl SessionRunner {
    #[must_use]
    pub fn new(
        clock: Clock,
        store: Arc<dyn MasteryStore>,
        provider: Arc<dyn QuestionProvider>,
        evaluator: Arc<dyn AnswerEvaluator>,
        sink: Arc<dyn CompletionSink>,
    ) -> Self {
        Self {
            clock,
            store,
            provider,
            evaluator,
            sink,
        }
    }

    /// Starts a session: resolves the learner, reads stored mastery
    /// (defaulting to 0.0 when absent), and requests the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Identity` before anything is issued if the
    /// learner or topic id is blank. Store and provider failures leave no
    /// session behind; the caller may simply call again.
    pub async fn start_session(
        &self,
        learner: &str,
        topic_id: &str,
        topic_title: &str,
    ) -> Result<AssessmentSession, SessionError> {
        let learner = LearnerId::new(learner)?;
        let topic_id = TopicId::new(topic_id)?;

        let mastery = self
            .store
            .read_mastery(&learner, &topic_id)
            .await?
            .unwrap_or_default();

        let mut session =
            AssessmentSession::new(learner, topic_id, topic_title, mastery, self.clock.now());
        debug!(session = %session.id(), mastery = %mastery, "session starting");

        let generated = self
            .provider
            .generate_question(session.topic_title(), mastery)
            .await
            .inspect_err(|e| warn!(session = %session.id(), "first question request failed: {e}"))?;
        session.install_question(generated)?;

        Ok(session)
    }

    /// Submits the learner's answer for the current round.
    ///
    /// Validation happens locally first; an invalid choice never reaches the
    /// evaluator. On success the session absorbs the evaluator's mastery and
    /// moves to `Evaluated`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Validation` for a rejected choice and
    /// `SessionError::Evaluator` for evaluator failures; in both cases
    /// mastery, the round counter, and the state are unchanged.
    pub async fn submit_answer(
        &self,
        session: &mut AssessmentSession,
        choice: &str,
    ) -> Result<RoundOutcome, SessionError> {
        session.validate_choice(choice)?;

        // validate_choice passing implies a current question exists.
        let Some(question) = session.current_question() else {
            return Err(crate::error::ValidationError::NotAwaitingAnswer {
                status: session.status(),
            }
            .into());
        };

        let submission = AnswerSubmission {
            question: question.prompt(),
            answer: choice,
            correct_answer: question.correct_answer(),
            topic: session.topic_title(),
            learner: session.learner(),
            topic_id: session.topic_id(),
            mastery: session.mastery(),
        };

        let graded = self
            .evaluator
            .evaluate(submission)
            .await
            .inspect_err(|e| warn!(session = %session.id(), "evaluation failed: {e}"))?;

        session.apply_evaluation(graded.evaluation.clone(), graded.new_mastery)?;
        debug!(
            session = %session.id(),
            score = %graded.evaluation.score(),
            mastery = %session.mastery(),
            answered = session.questions_answered(),
            "answer evaluated"
        );

        Ok(RoundOutcome {
            evaluation: graded.evaluation,
            mastery: session.mastery(),
            progress: session.progress(),
        })
    }

    /// Advances past an evaluated round: either requests the next question
    /// or, once the round limit is reached, completes the session and fires
    /// the completion sink with the final mastery.
    ///
    /// Calling this in any state other than `Evaluated` (including after
    /// completion) changes nothing and reports `Advance::Unchanged`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Provider` if the next-question request fails;
    /// the session stays `Evaluated` so the caller can retry.
    pub async fn advance(
        &self,
        session: &mut AssessmentSession,
    ) -> Result<Advance, SessionError> {
        if session.status() != SessionStatus::Evaluated {
            return Ok(Advance::Unchanged);
        }

        if session.round_limit_reached() {
            let summary = session.complete(self.clock.now())?;
            self.sink.on_complete(summary.final_mastery()).await;
            debug!(
                session = %summary.session_id(),
                mastery = %summary.final_mastery(),
                "session completed"
            );
            return Ok(Advance::Completed(summary));
        }

        let generated = self
            .provider
            .generate_question(session.topic_title(), session.mastery())
            .await
            .inspect_err(|e| warn!(session = %session.id(), "next question request failed: {e}"))?;
        session.install_question(generated)?;

        Ok(Advance::NextQuestion)
    }
}
