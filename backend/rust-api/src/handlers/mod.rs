use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;
use validator::ValidationErrors;

use crate::metrics;
use crate::services::{error::PracticeError, AppState};

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let questions = state.questions.count().await;
    let practice_sessions = state.practice.len().await;

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "advocacy-practice-api",
            "version": env!("CARGO_PKG_VERSION"),
            "questions": questions,
            "practice_sessions": practice_sessions,
        })),
    )
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// Protects /metrics with HTTP Basic auth against `METRICS_AUTH` (user:password).
pub async fn metrics_auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let encoded = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let decoded = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let credentials = String::from_utf8(decoded).map_err(|_| StatusCode::UNAUTHORIZED)?;

    let expected = std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string());
    if credentials != expected {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    UnsupportedMedia(String),
    Unprocessable(String),
}

impl From<PracticeError> for ApiError {
    fn from(err: PracticeError) -> Self {
        let message = err.to_string();
        match err {
            PracticeError::QuestionNotFound(_) | PracticeError::SessionNotFound(_) => {
                ApiError::NotFound(message)
            }
            PracticeError::CardCollapsed(_)
            | PracticeError::UploadInProgress(_)
            | PracticeError::UploadAlreadyCompleted(_) => ApiError::Conflict(message),
            PracticeError::NoAcceptedFile { .. } => ApiError::UnsupportedMedia(message),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        ApiError::Unprocessable(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::UnsupportedMedia(message) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, message),
            ApiError::Unprocessable(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        };
        tracing::debug!(status = status.as_u16(), %message, "Request failed");
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub mod admin;
pub mod auth;
pub mod practice;
pub mod sse;
