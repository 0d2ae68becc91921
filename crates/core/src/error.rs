use thiserror::Error;

use crate::model::IdentityError;
use crate::model::QuestionError;
use crate::model::SessionSummaryError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}
