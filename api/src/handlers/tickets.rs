//! Ticket handlers
//!
//! Support tickets: users open them, admins reply and close them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use super::require_admin;
use crate::domain::entities::{Ticket, TicketId, User};
use crate::error::AppError;
use crate::AppState;

/// Request to open a ticket
#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub message: String,
}

/// Request to reply to a ticket
#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub reply: String,
}

/// GET /api/tickets
///
/// List tickets: admins see all, users see their own.
pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Ticket>>, AppError> {
    Ok(Json(state.support_service.list_for(&user).await?))
}

/// POST /api/tickets
///
/// Open a new support ticket.
pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    let ticket = state
        .support_service
        .open(&user, &request.subject, &request.message)
        .await?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// POST /api/tickets/:id/reply
///
/// Reply to a ticket and close it (admin only).
pub async fn reply_to_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<Ticket>, AppError> {
    require_admin(&user)?;

    let ticket = state
        .support_service
        .reply(&TicketId::from(id), &request.reply)
        .await?;
    Ok(Json(ticket))
}
