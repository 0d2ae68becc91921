use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::model::{Mastery, SessionId, TopicId};

/// Number of rounds after which a session terminates.
pub const ROUND_LIMIT: u32 = 5;

//
// ─── STATUS ───────────────────────────────────────────────────────────────────
//

/// Lifecycle state of an assessment session.
///
/// Transitions are owned by the session controller; nothing else moves a
/// session between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Mastery read and first question request in flight.
    Initializing,
    /// A question is on display and no answer has been accepted yet.
    AwaitingAnswer,
    /// The latest answer has been graded and mastery updated.
    Evaluated,
    /// Terminal. The completion sink has been invoked.
    Completed,
}

impl SessionStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Initializing => "initializing",
            Self::AwaitingAnswer => "awaiting answer",
            Self::Evaluated => "evaluated",
            Self::Completed => "completed",
        };
        write!(f, "{label}")
    }
}

//
// ─── SUMMARY ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("rounds answered ({rounds}) exceeds the round limit ({ROUND_LIMIT})")]
    TooManyRounds { rounds: u32 },
}

/// Final report for a completed assessment session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    session_id: SessionId,
    topic_id: TopicId,
    topic_title: String,
    rounds_answered: u32,
    final_mastery: Mastery,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl SessionSummary {
    /// Builds a summary, validating time order and the round bound.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is
    /// before `started_at`, and `SessionSummaryError::TooManyRounds` if more
    /// rounds were answered than the limit permits.
    pub fn from_parts(
        session_id: SessionId,
        topic_id: TopicId,
        topic_title: impl Into<String>,
        rounds_answered: u32,
        final_mastery: Mastery,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        if rounds_answered > ROUND_LIMIT {
            return Err(SessionSummaryError::TooManyRounds {
                rounds: rounds_answered,
            });
        }

        Ok(Self {
            session_id,
            topic_id,
            topic_title: topic_title.into(),
            rounds_answered,
            final_mastery,
            started_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
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
    pub fn rounds_answered(&self) -> u32 {
        self.rounds_answered
    }

    #[must_use]
    pub fn final_mastery(&self) -> Mastery {
        self.final_mastery
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
