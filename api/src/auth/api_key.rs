//! API key authentication middleware

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::app::hash_api_key;
use crate::error::AppError;
use crate::AppState;

/// Extract the API key from the Authorization header
fn extract_api_key(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Authentication middleware
///
/// Validates the API key and injects the User into request extensions.
/// Routes that require authentication should use this middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = extract_api_key(&request).ok_or(AppError::Unauthorized)?;

    let key_hash = hash_api_key(api_key);
    let user = state
        .account_service
        .find_by_api_key(&key_hash)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Optional authentication middleware
///
/// Like auth_middleware but doesn't fail if no auth is provided. The user
/// is absent from extensions if not authenticated. Used by the gated item
/// read, where anonymous requests are still allowed to see free items.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(api_key) = extract_api_key(&request) {
        let key_hash = hash_api_key(api_key);

        if let Ok(Some(user)) = state.account_service.find_by_api_key(&key_hash).await {
            request.extensions_mut().insert(user);
        }
    }

    next.run(request).await
}
