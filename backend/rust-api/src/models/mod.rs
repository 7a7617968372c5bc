pub mod identity;
pub mod practice;
pub mod question;
pub mod upload;

pub use identity::{IdentityProviderConfig, PasswordPolicy, PasswordViolation};
pub use practice::{BrowserSessionCreated, CardView};
pub use question::{seed_questions, Difficulty, Question, QuestionDraft};
pub use upload::{CandidateFile, DropFilesRequest, UploadProgressEvent, UploadStatus};
