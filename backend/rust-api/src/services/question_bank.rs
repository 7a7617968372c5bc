use std::sync::Arc;

use crate::metrics::QUESTION_BANK_OPERATIONS_TOTAL;
use crate::models::question::{Question, QuestionDraft};
use crate::services::error::{PracticeError, PracticeResult};
use crate::services::question_store::QuestionRepository;

/// Management view state: the question list plus the form's editing target.
pub struct QuestionBankEditor {
    store: Arc<dyn QuestionRepository>,
    editing: Option<Question>,
}

impl QuestionBankEditor {
    pub fn new(store: Arc<dyn QuestionRepository>) -> Self {
        Self {
            store,
            editing: None,
        }
    }

    pub async fn list(&self) -> Vec<Question> {
        self.store.list().await
    }

    pub fn editing_target(&self) -> Option<&Question> {
        self.editing.as_ref()
    }

    /// Creates a question, or overwrites the editing target when one is set.
    /// The editing target is cleared either way.
    pub async fn save(&mut self, draft: QuestionDraft) -> PracticeResult<Question> {
        let target = self.editing.take();

        let saved = match target {
            Some(target) => {
                let replacement = draft.into_question(target.id);
                let saved = self
                    .store
                    .replace(replacement)
                    .await
                    .ok_or(PracticeError::QuestionNotFound(target.id))?;
                QUESTION_BANK_OPERATIONS_TOTAL
                    .with_label_values(&["update"])
                    .inc();
                tracing::info!(question_id = saved.id, "Question updated");
                saved
            }
            None => {
                let created = self.store.insert(draft).await;
                QUESTION_BANK_OPERATIONS_TOTAL
                    .with_label_values(&["create"])
                    .inc();
                tracing::info!(
                    question_id = created.id,
                    difficulty = %created.difficulty,
                    "Question created"
                );
                created
            }
        };

        Ok(saved)
    }

    /// Selects a stored question as the editing target.
    pub async fn edit(&mut self, id: u32) -> PracticeResult<&Question> {
        let question = self
            .store
            .get(id)
            .await
            .ok_or(PracticeError::QuestionNotFound(id))?;
        tracing::debug!(question_id = id, "Editing target selected");
        Ok(self.editing.insert(question))
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Removes a question immediately, there is no undo.
    pub async fn delete(&mut self, id: u32) -> PracticeResult<Question> {
        let removed = self
            .store
            .remove(id)
            .await
            .ok_or(PracticeError::QuestionNotFound(id))?;

        if self.editing.as_ref().is_some_and(|q| q.id == id) {
            self.editing = None;
        }

        QUESTION_BANK_OPERATIONS_TOTAL
            .with_label_values(&["delete"])
            .inc();
        tracing::info!(question_id = id, "Question deleted");
        Ok(removed)
    }
}
