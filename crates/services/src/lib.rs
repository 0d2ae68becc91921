#![forbid(unsafe_code)]

pub mod collaborators;
pub mod error;
pub mod remote;
pub mod sessions;

pub use tutor_core::Clock;

pub use collaborators::{
    AnswerEvaluator, AnswerSubmission, CompletionSink, GeneratedQuestion, GradedAnswer,
    QuestionProvider,
};
pub use error::{
    EvaluatorError, ProviderError, RemoteInitError, SessionError, SessionStateError,
    ValidationError,
};
pub use remote::{RemoteAssessmentConfig, RemoteAssessmentService};
pub use sessions::{Advance, AssessmentSession, RoundOutcome, SessionProgress, SessionRunner};
