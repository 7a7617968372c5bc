use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    models::identity::{IdentityProviderConfig, PasswordCheckRequest, PasswordCheckResponse},
    services::AppState,
};

/// GET /api/v1/auth/config - client configuration for the identity provider
pub async fn get_identity_config(
    State(state): State<Arc<AppState>>,
) -> Json<IdentityProviderConfig> {
    Json(state.config.identity.clone())
}

/// POST /api/v1/auth/password-policy/check
///
/// Lets the sign-up form report every unmet rule at once instead of waiting
/// for the provider to reject the password.
pub async fn check_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordCheckRequest>,
) -> Json<PasswordCheckResponse> {
    let violations = state.config.identity.password_policy.check(&req.password);
    Json(PasswordCheckResponse {
        valid: violations.is_empty(),
        violations,
    })
}
