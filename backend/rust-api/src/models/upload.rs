use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress increment applied on every timer tick.
pub const PROGRESS_STEP: u8 = 10;
pub const PROGRESS_COMPLETE: u8 = 100;

/// Outcome of a card's simulated upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadStatus {
    Idle,
    Uploading {
        progress: u8,
    },
    #[serde(rename = "success")]
    Succeeded,
    #[serde(rename = "error")]
    Failed {
        reason: String,
    },
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Succeeded | UploadStatus::Failed { .. })
    }
}

/// A file offered to a card's drop zone. Only its metadata is ever looked at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFile {
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl CandidateFile {
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

#[derive(Debug, Deserialize)]
pub struct DropFilesRequest {
    #[serde(default)]
    pub files: Vec<CandidateFile>,
}

/// Payload of one `upload-progress` SSE event.
#[derive(Debug, Clone, Serialize)]
pub struct UploadProgressEvent {
    pub question_id: u32,
    #[serde(flatten)]
    pub status: UploadStatus,
    pub timestamp: DateTime<Utc>,
}

impl UploadProgressEvent {
    pub const EVENT_NAME: &'static str = "upload-progress";

    pub fn to_sse_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
