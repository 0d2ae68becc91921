use chrono::{DateTime, Utc};
use std::fmt;

use tutor_core::model::{
    Evaluation, LearnerId, Level, Mastery, Question, ROUND_LIMIT, SessionId, SessionStatus,
    SessionSummary, TopicId,
};

use super::progress::SessionProgress;
use crate::collaborators::GeneratedQuestion;
use crate::error::{SessionError, SessionStateError, ValidationError};

/// In-memory state machine for one assessment session.
///
/// Holds the mastery value, the round counter, and the ephemeral question and
/// evaluation for the current round. All transitions are fallible methods;
/// the `SessionRunner` is the only caller that pairs them with collaborator
/// I/O. Mastery changes exactly one way: through [`apply_evaluation`] with a
/// value the evaluator produced.
///
/// [`apply_evaluation`]: AssessmentSession::apply_evaluation
pub struct AssessmentSession {
    id: SessionId,
    learner: LearnerId,
    topic_id: TopicId,
    topic_title: String,
    mastery: Mastery,
    questions_answered: u32,
    status: SessionStatus,
    level: Option<Level>,
    question: Option<Question>,
    evaluation: Option<Evaluation>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl AssessmentSession {
    /// Creates a session in `Initializing`, before the first question has
    /// arrived.
    ///
    /// `initial_mastery` comes from the mastery store (0.0 when absent);
    /// `started_at` should come from the services layer clock.
    #[must_use]
    pub fn new(
        learner: LearnerId,
        topic_id: TopicId,
        topic_title: impl Into<String>,
        initial_mastery: Mastery,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            learner,
            topic_id,
            topic_title: topic_title.into(),
            mastery: initial_mastery,
            questions_answered: 0,
            status: SessionStatus::Initializing,
            level: None,
            question: None,
            evaluation: None,
            started_at,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn learner(&self) -> &LearnerId {
        &self.learner
    }

    #[must_use]
    pub fn topic_id(&self) -> &TopicId {
        &self.topic_id
    }

    #[must_use]
    pub fn topic_title(&self) -> &str {
        &self.topic_title
    }

    #[must_use]
    pub fn mastery(&self) -> Mastery {
        self.mastery
    }

    #[must_use]
    pub fn questions_answered(&self) -> u32 {
        self.questions_answered
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Difficulty label attached to the current question, if one has arrived.
    #[must_use]
    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// Evaluation of the most recently graded round.
    #[must_use]
    pub fn last_evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether enough rounds have been answered to finish the session.
    #[must_use]
    pub fn round_limit_reached(&self) -> bool {
        self.questions_answered >= ROUND_LIMIT
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            answered: self.questions_answered,
            limit: ROUND_LIMIT,
            remaining: ROUND_LIMIT.saturating_sub(self.questions_answered),
            is_complete: self.is_complete(),
        }
    }

    /// Installs the question for the next round and moves to
    /// `AwaitingAnswer`. The previous round's question and evaluation are
    /// discarded here.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::QuestionNotExpected` unless the session is
    /// `Initializing` (first round) or `Evaluated` (advancing).
    pub fn install_question(&mut self, generated: GeneratedQuestion) -> Result<(), SessionStateError> {
        match self.status {
            SessionStatus::Initializing | SessionStatus::Evaluated => {
                self.question = Some(generated.question);
                self.level = Some(generated.level);
                self.evaluation = None;
                self.status = SessionStatus::AwaitingAnswer;
                Ok(())
            }
            status => Err(SessionStateError::QuestionNotExpected { status }),
        }
    }

    /// Checks a submitted choice against the current question.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the session is not awaiting an answer, the
    /// choice is empty, or the choice is not among the offered options.
    pub fn validate_choice(&self, choice: &str) -> Result<(), ValidationError> {
        let Some(question) = &self.question else {
            return Err(ValidationError::NotAwaitingAnswer {
                status: self.status,
            });
        };
        if self.status != SessionStatus::AwaitingAnswer {
            return Err(ValidationError::NotAwaitingAnswer {
                status: self.status,
            });
        }
        if choice.trim().is_empty() {
            return Err(ValidationError::EmptyChoice);
        }
        if !question.offers(choice) {
            return Err(ValidationError::ChoiceNotOffered {
                choice: choice.to_owned(),
            });
        }
        Ok(())
    }

    /// Absorbs a successful evaluator response: sets the new mastery,
    /// increments the round counter, and moves to `Evaluated`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotAwaitingAnswer` if no answer was pending.
    pub fn apply_evaluation(
        &mut self,
        evaluation: Evaluation,
        new_mastery: Mastery,
    ) -> Result<(), ValidationError> {
        if self.status != SessionStatus::AwaitingAnswer {
            return Err(ValidationError::NotAwaitingAnswer {
                status: self.status,
            });
        }

        self.mastery = new_mastery;
        self.evaluation = Some(evaluation);
        self.questions_answered += 1;
        self.status = SessionStatus::Evaluated;
        Ok(())
    }

    /// Moves the session to its terminal state and builds the summary.
    ///
    /// The ephemeral question and evaluation are dropped; the session keeps
    /// only what the summary reports.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::CompletionNotReady` unless the session is
    /// `Evaluated`, and `SessionStateError::RoundsRemaining` if fewer than
    /// the round limit have been answered.
    pub fn complete(&mut self, completed_at: DateTime<Utc>) -> Result<SessionSummary, SessionError> {
        if self.status != SessionStatus::Evaluated {
            return Err(SessionStateError::CompletionNotReady {
                status: self.status,
            }
            .into());
        }
        if !self.round_limit_reached() {
            return Err(SessionStateError::RoundsRemaining {
                answered: self.questions_answered,
            }
            .into());
        }

        let summary = SessionSummary::from_parts(
            self.id,
            self.topic_id.clone(),
            self.topic_title.clone(),
            self.questions_answered,
            self.mastery,
            self.started_at,
            completed_at,
        )?;

        self.status = SessionStatus::Completed;
        self.completed_at = Some(completed_at);
        self.question = None;
        self.evaluation = None;
        Ok(summary)
    }
}

impl fmt::Debug for AssessmentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentSession")
            .field("id", &self.id)
            .field("topic_id", &self.topic_id)
            .field("status", &self.status)
            .field("mastery", &self.mastery)
            .field("questions_answered", &self.questions_answered)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
