use thiserror::Error;
use uuid::Uuid;

/// Failures of the question bank and the practice browser.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PracticeError {
    #[error("Question {0} not found")]
    QuestionNotFound(u32),

    #[error("Practice session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Card for question {0} is collapsed, expand it before dropping a file")]
    CardCollapsed(u32),

    #[error("An upload is already running for question {0}")]
    UploadInProgress(u32),

    #[error("The response for question {0} was already uploaded")]
    UploadAlreadyCompleted(u32),

    #[error("No accepted video file in the drop (accepted: {accepted})")]
    NoAcceptedFile { accepted: String },
}

pub type PracticeResult<T> = Result<T, PracticeError>;
