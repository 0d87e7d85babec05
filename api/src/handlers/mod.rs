//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod auth;
pub mod codes;
pub mod items;
pub mod tickets;
pub mod transactions;

pub use auth::{me, register};
pub use codes::{generate_codes, redeem_code};
pub use items::{create_item, delete_item, get_item, list_items, purchase_item};
pub use tickets::{create_ticket, list_tickets, reply_to_ticket};
pub use transactions::{
    approve_transaction, create_transaction, list_transactions, reject_transaction,
    update_transaction,
};

use serde::Serialize;

use crate::domain::entities::User;
use crate::error::AppError;

/// Plain message response used by a few endpoints
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Guard for admin-only endpoints
fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
