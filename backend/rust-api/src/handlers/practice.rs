use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    handlers::ApiError,
    models::{
        practice::{BrowserSessionCreated, CardView},
        upload::{DropFilesRequest, UploadStatus},
    },
    services::AppState,
};

/// POST /api/v1/practice/sessions - mount a practice page
pub async fn open_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (session_id, browser) = state.practice.open().await;
    let cards = browser.lock().await.cards().await;

    (
        StatusCode::CREATED,
        Json(BrowserSessionCreated {
            session_id,
            created_at: Utc::now(),
            cards,
        }),
    )
}

/// DELETE /api/v1/practice/sessions/:sid - unmount the page
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    state.practice.close(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/practice/sessions/:sid/cards
pub async fn list_cards(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<CardView>>, ApiError> {
    let browser = state.practice.get(parse_session_id(&session_id)?).await?;
    let cards = browser.lock().await.cards().await;
    Ok(Json(cards))
}

/// GET /api/v1/practice/sessions/:sid/cards/:qid
pub async fn get_card(
    State(state): State<Arc<AppState>>,
    Path((session_id, question_id)): Path<(String, u32)>,
) -> Result<Json<CardView>, ApiError> {
    let browser = state.practice.get(parse_session_id(&session_id)?).await?;
    let card = browser.lock().await.card(question_id).await?;
    Ok(Json(card))
}

/// POST /api/v1/practice/sessions/:sid/cards/:qid/toggle - expand or collapse
pub async fn toggle_card(
    State(state): State<Arc<AppState>>,
    Path((session_id, question_id)): Path<(String, u32)>,
) -> Result<Json<CardView>, ApiError> {
    let browser = state.practice.get(parse_session_id(&session_id)?).await?;
    let card = browser.lock().await.toggle(question_id).await?;
    Ok(Json(card))
}

/// POST /api/v1/practice/sessions/:sid/cards/:qid/upload - drop files on the card
pub async fn drop_files(
    State(state): State<Arc<AppState>>,
    Path((session_id, question_id)): Path<(String, u32)>,
    Json(req): Json<DropFilesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let browser = state.practice.get(parse_session_id(&session_id)?).await?;
    let card = browser
        .lock()
        .await
        .drop_files(question_id, req.files)
        .await?;

    let status = match card.upload {
        UploadStatus::Uploading { .. } => StatusCode::ACCEPTED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(card)))
}

pub(crate) fn parse_session_id(value: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value)
        .map_err(|_| ApiError::BadRequest("Invalid session_id: must be a UUID".to_string()))
}
