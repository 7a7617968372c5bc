use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    response
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest("/api/v1/auth", auth_routes())
        .nest("/api/v1/practice", practice_routes())
        .nest("/admin", admin_routes())
        .with_state(app_state)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(csp_middleware))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/config", get(handlers::auth::get_identity_config))
        .route(
            "/password-policy/check",
            post(handlers::auth::check_password),
        )
}

fn practice_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(handlers::practice::open_session))
        .route(
            "/sessions/{sid}",
            axum::routing::delete(handlers::practice::close_session),
        )
        .route("/sessions/{sid}/cards", get(handlers::practice::list_cards))
        .route(
            "/sessions/{sid}/cards/{qid}",
            get(handlers::practice::get_card),
        )
        .route(
            "/sessions/{sid}/cards/{qid}/toggle",
            post(handlers::practice::toggle_card),
        )
        .route(
            "/sessions/{sid}/cards/{qid}/upload",
            post(handlers::practice::drop_files),
        )
        .route(
            "/sessions/{sid}/cards/{qid}/upload/stream",
            get(handlers::sse::upload_stream),
        )
}

fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/questions",
            get(handlers::admin::list_questions).post(handlers::admin::save_question),
        )
        .route(
            "/questions/editing",
            get(handlers::admin::get_editing_target).delete(handlers::admin::cancel_edit),
        )
        .route(
            "/questions/{id}",
            axum::routing::delete(handlers::admin::delete_question),
        )
        .route(
            "/questions/{id}/edit",
            post(handlers::admin::edit_question),
        )
}
