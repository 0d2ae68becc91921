//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use tutor_core::model::{IdentityError, QuestionError, SessionStatus, SessionSummaryError};

/// Local answer-validation failures.
///
/// Raised before any collaborator call, so a rejected submission never
/// reaches the network and never changes session state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("no answer can be accepted while the session is {status}")]
    NotAwaitingAnswer { status: SessionStatus },

    #[error("submitted answer is empty")]
    EmptyChoice,

    #[error("submitted answer is not one of the offered options: {choice:?}")]
    ChoiceNotOffered { choice: String },
}

/// Attempted state transitions the session does not permit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("cannot install a question while the session is {status}")]
    QuestionNotExpected { status: SessionStatus },

    #[error("cannot complete the session while it is {status}")]
    CompletionNotReady { status: SessionStatus },

    #[error("round limit not reached yet ({answered} answered)")]
    RoundsRemaining { answered: u32 },
}

/// Errors emitted by question providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("question request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("question provider declined the request: {0}")]
    Rejected(String),

    #[error("question provider returned an empty response")]
    EmptyResponse,

    #[error(transparent)]
    Contract(#[from] QuestionError),

    #[error("question provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by answer evaluators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvaluatorError {
    #[error("evaluation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("answer evaluator declined the request: {0}")]
    Rejected(String),

    #[error("answer evaluator returned an empty response")]
    EmptyResponse,

    #[error("answer evaluator unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while constructing the remote assessment client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteInitError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Caller-facing aggregate for session operations.
///
/// Every failure leaves the session in a well-defined, re-enterable state;
/// retrying the same operation is always safe.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] SessionStateError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}
