//! Purchase domain entity
//!
//! Append-only log record. The existence of a (user, item) pair is the
//! source of truth for "already purchased"; the number of records for the
//! pair is the delivery cursor for sequential items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::ItemId;
use super::user::UserId;

/// Unique identifier for a purchase record (opaque string, allocated by the store)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseId(pub String);

impl From<String> for PurchaseId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One delivered purchase
#[derive(Debug, Clone, Serialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub item_id: ItemId,
    /// The content that was delivered for this purchase
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Data needed to append a purchase record
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub content: String,
}
