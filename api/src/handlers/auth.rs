//! Auth handlers
//!
//! Registration and the authenticated-principal lookup.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::domain::entities::User;
use crate::error::AppError;
use crate::AppState;

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
}

/// Response body for registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: String,
    pub username: String,
    pub role: String,
    pub credits: i64,
    /// Bearer API key (only shown once, stored hashed)
    pub api_key: String,
    pub message: String,
}

/// POST /api/auth/register
///
/// Register a new user. Returns the API key (only shown once).
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let (user, api_key) = state.account_service.register(&request.username).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id.to_string(),
            username: user.username,
            role: user.role.to_string(),
            credits: user.credits,
            api_key,
            message: "Save this API key - it won't be shown again. \
                      Use it as: Authorization: Bearer <api_key>"
                .to_string(),
        }),
    ))
}

/// GET /api/auth/me
///
/// Return the authenticated user.
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
