//! Ticket domain entity
//!
//! A support ticket opened by a user. An admin reply closes it; a ticket
//! is only ever closed together with a reply, and only once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Unique identifier for a ticket (opaque string, allocated by the store)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub String);

impl From<String> for TicketId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TicketId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ticket status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Closed,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(format!("Unknown ticket status: {}", s)),
        }
    }
}

/// A support ticket
#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub id: TicketId,
    pub user_id: UserId,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    /// Set exactly when the ticket is closed
    pub reply: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn is_closed(&self) -> bool {
        self.status == TicketStatus::Closed
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }
}

/// Data needed to open a new ticket (status is always `open`)
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub user_id: UserId,
    pub subject: String,
    pub message: String,
}
