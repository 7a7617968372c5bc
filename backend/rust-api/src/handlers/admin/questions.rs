use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    handlers::ApiError,
    models::question::{Question, QuestionDraft},
    services::AppState,
};

/// GET /admin/questions - the bank in display order
pub async fn list_questions(State(state): State<Arc<AppState>>) -> Json<Vec<Question>> {
    let editor = state.editor.lock().await;
    Json(editor.list().await)
}

/// POST /admin/questions - create, or overwrite the editing target
pub async fn save_question(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<QuestionDraft>,
) -> Result<impl IntoResponse, ApiError> {
    draft.validate()?;

    let mut editor = state.editor.lock().await;
    let creating = editor.editing_target().is_none();
    let saved = editor.save(draft).await?;

    let status = if creating {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(saved)))
}

/// POST /admin/questions/:id/edit - select the editing target
pub async fn edit_question(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<u32>,
) -> Result<Json<Question>, ApiError> {
    let mut editor = state.editor.lock().await;
    let target = editor.edit(question_id).await?;
    Ok(Json(target.clone()))
}

/// GET /admin/questions/editing - current editing target, `null` when creating
pub async fn get_editing_target(State(state): State<Arc<AppState>>) -> Json<Option<Question>> {
    let editor = state.editor.lock().await;
    Json(editor.editing_target().cloned())
}

/// DELETE /admin/questions/editing - the form's Cancel button
pub async fn cancel_edit(State(state): State<Arc<AppState>>) -> StatusCode {
    state.editor.lock().await.cancel_edit();
    StatusCode::NO_CONTENT
}

/// DELETE /admin/questions/:id - remove without confirmation
pub async fn delete_question(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<u32>,
) -> Result<StatusCode, ApiError> {
    state.editor.lock().await.delete(question_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
