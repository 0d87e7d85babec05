//! Transaction domain entity
//!
//! A user-submitted credit top-up request. Created `pending` and resolved
//! by an admin exactly once, to `approved` or `rejected`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Unique identifier for a transaction (opaque string, allocated by the store)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

impl From<String> for TransactionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Approved => write!(f, "approved"),
            TransactionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "approved" => Ok(TransactionStatus::Approved),
            "rejected" => Ok(TransactionStatus::Rejected),
            _ => Err(format!("Unknown transaction status: {}", s)),
        }
    }
}

/// A credit top-up request
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    /// External payment reference supplied by the user
    pub reference: String,
    pub amount: i64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_resolved(&self) -> bool {
        self.status != TransactionStatus::Pending
    }
}

/// Data needed to create a new transaction (status is always `pending`)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub reference: String,
    pub amount: i64,
}
