use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use chrono::Utc;
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::watch;

use crate::{
    handlers::{practice::parse_session_id, ApiError},
    models::upload::{UploadProgressEvent, UploadStatus},
    services::AppState,
};

/// SSE endpoint for upload progress
/// GET /api/v1/practice/sessions/{sid}/cards/{qid}/upload/stream
///
/// Emits the current status right away, then every change. The stream ends
/// after a terminal status, or when the upload is discarded.
pub async fn upload_stream(
    State(state): State<Arc<AppState>>,
    Path((session_id, question_id)): Path<(String, u32)>,
) -> Result<impl IntoResponse, ApiError> {
    let browser = state.practice.get(parse_session_id(&session_id)?).await?;
    let receiver = browser.lock().await.subscribe(question_id).await?;

    tracing::info!(%session_id, question_id, "Client connected to upload stream");

    Ok(Sse::new(progress_stream(question_id, receiver)).keep_alive(KeepAlive::default()))
}

fn progress_stream(
    question_id: u32,
    receiver: watch::Receiver<UploadStatus>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(
        (receiver, true, false),
        move |(mut rx, first, done)| async move {
            if done {
                return None;
            }

            let status = if first {
                rx.borrow_and_update().clone()
            } else {
                rx.changed().await.ok()?;
                rx.borrow_and_update().clone()
            };

            let finished = status.is_terminal();
            let event = UploadProgressEvent {
                question_id,
                status,
                timestamp: Utc::now(),
            };
            let event = Event::default()
                .event(UploadProgressEvent::EVENT_NAME)
                .data(event.to_sse_data());

            Some((Ok(event), (rx, false, finished)))
        },
    )
}
