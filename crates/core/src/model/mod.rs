mod evaluation;
mod ids;
mod mastery;
mod question;
mod session;

pub use evaluation::{Evaluation, NO_CORRECTION};
pub use ids::{IdentityError, LearnerId, SessionId, TopicId};
pub use mastery::{Mastery, Score};
pub use question::{Level, Question, QuestionError};
pub use session::{ROUND_LIMIT, SessionStatus, SessionSummary, SessionSummaryError};
