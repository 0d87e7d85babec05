//! Redeem code domain entity
//!
//! A one-time token exchangeable for a fixed credit amount. Once marked
//! used it never reverts; the value is fixed at creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Unique identifier for a redeem code (opaque string, allocated by the store)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedeemCodeId(pub String);

impl From<String> for RedeemCodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RedeemCodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for RedeemCodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A one-time credit voucher
#[derive(Debug, Clone, Serialize)]
pub struct RedeemCode {
    pub id: RedeemCodeId,
    /// Uppercase hex token, unique across the store
    pub code: String,
    /// Credits granted on redemption
    pub value: i64,
    pub is_used: bool,
    pub used_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Length in bytes of the random token (16 hex characters once encoded)
pub const CODE_TOKEN_BYTES: usize = 8;

/// Normalize a user-supplied code for lookup (tokens are stored uppercase)
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
