//! Transaction handlers
//!
//! Credit top-up requests and their admin resolution.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use super::require_admin;
use crate::domain::entities::{Transaction, TransactionId, User};
use crate::error::AppError;
use crate::AppState;

/// Request to submit a top-up
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// External payment reference
    pub reference: String,
    pub amount: i64,
}

/// Request to overwrite a transaction's amount
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    pub amount: i64,
}

/// GET /api/transactions
///
/// List every transaction (admin only).
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    require_admin(&user)?;
    Ok(Json(state.billing_service.list_transactions().await?))
}

/// POST /api/transactions
///
/// Submit a pending top-up request for the caller.
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let tx = state
        .billing_service
        .submit(&user.id, &request.reference, request.amount)
        .await?;

    Ok((StatusCode::CREATED, Json(tx)))
}

/// PATCH /api/transactions/:id
///
/// Overwrite a transaction's amount (admin only).
pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTransactionRequest>,
) -> Result<Json<Transaction>, AppError> {
    require_admin(&user)?;

    let tx = state
        .billing_service
        .set_amount(&TransactionId::from(id), request.amount)
        .await?;
    Ok(Json(tx))
}

/// POST /api/transactions/:id/approve
///
/// Approve a pending transaction and credit its owner (admin only).
pub async fn approve_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, AppError> {
    require_admin(&user)?;

    let tx = state
        .billing_service
        .approve(&TransactionId::from(id))
        .await?;
    Ok(Json(tx))
}

/// POST /api/transactions/:id/reject
///
/// Reject a pending transaction (admin only).
pub async fn reject_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, AppError> {
    require_admin(&user)?;

    let tx = state
        .billing_service
        .reject(&TransactionId::from(id))
        .await?;
    Ok(Json(tx))
}
