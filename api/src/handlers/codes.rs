//! Redeem code handlers
//!
//! Admin code minting and one-time redemption.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use super::require_admin;
use crate::domain::entities::{RedeemCode, User};
use crate::error::AppError;
use crate::AppState;

/// Request to mint a batch of codes
#[derive(Debug, Deserialize)]
pub struct GenerateCodesRequest {
    pub value: i64,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

/// A freshly minted code
#[derive(Debug, Serialize)]
pub struct CodeResponse {
    pub id: String,
    pub code: String,
    pub value: i64,
}

impl From<&RedeemCode> for CodeResponse {
    fn from(code: &RedeemCode) -> Self {
        Self {
            id: code.id.to_string(),
            code: code.code.clone(),
            value: code.value,
        }
    }
}

/// Request to redeem a code
#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

/// Response body for a redemption
#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub message: String,
    pub value: i64,
}

/// POST /api/codes
///
/// Mint a batch of redeem codes (admin only).
pub async fn generate_codes(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<GenerateCodesRequest>,
) -> Result<(StatusCode, Json<Vec<CodeResponse>>), AppError> {
    require_admin(&user)?;

    let codes = state
        .billing_service
        .generate_codes(request.value, request.count)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(codes.iter().map(CodeResponse::from).collect()),
    ))
}

/// POST /api/codes/redeem
///
/// Redeem a one-time code and credit its value to the caller.
pub async fn redeem_code(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, AppError> {
    let claimed = state.billing_service.redeem(&user.id, &request.code).await?;

    Ok(Json(RedeemResponse {
        message: "Code redeemed".to_string(),
        value: claimed.value,
    }))
}
