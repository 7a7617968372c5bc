use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::question::{Difficulty, Question};
use super::upload::UploadStatus;

/// One question card as a viewer sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub question_id: u32,
    pub title: String,
    pub difficulty: Difficulty,
    pub time_limit: String,
    pub expanded: bool,
    /// Only rendered while the card is expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub upload: UploadStatus,
    /// Present once the upload succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_answer: Option<String>,
}

impl CardView {
    pub fn new(question: &Question, expanded: bool, upload: UploadStatus) -> Self {
        let model_answer = match &upload {
            UploadStatus::Succeeded if expanded => Some(question.answer.clone()),
            _ => None,
        };

        CardView {
            question_id: question.id,
            title: question.title.clone(),
            difficulty: question.difficulty,
            time_limit: question.time_limit.clone(),
            expanded,
            description: expanded.then(|| question.description.clone()),
            upload,
            model_answer,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BrowserSessionCreated {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub cards: Vec<CardView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::seed_questions;

    #[test]
    fn collapsed_card_hides_description_and_answer() {
        let question = &seed_questions()[0];
        let view = CardView::new(question, false, UploadStatus::Idle);
        assert!(view.description.is_none());
        assert!(view.model_answer.is_none());
    }

    #[test]
    fn answer_is_revealed_only_after_success() {
        let question = &seed_questions()[1];

        let uploading = CardView::new(question, true, UploadStatus::Uploading { progress: 90 });
        assert!(uploading.model_answer.is_none());

        let done = CardView::new(question, true, UploadStatus::Succeeded);
        assert_eq!(done.model_answer.as_deref(), Some(question.answer.as_str()));
        assert_eq!(done.description.as_deref(), Some(question.description.as_str()));
    }
}
