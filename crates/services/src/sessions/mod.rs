mod progress;
mod session;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use session::AssessmentSession;
pub use workflow::{Advance, RoundOutcome, SessionRunner};
