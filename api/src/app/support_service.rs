//! Support service
//!
//! Ticket lifecycle: users open tickets, admins reply (which closes them),
//! and listing is scoped to the caller's role.

use std::sync::Arc;

use crate::domain::entities::{NewTicket, Ticket, TicketId, User};
use crate::domain::ports::Storage;
use crate::error::{AppError, DomainError};

/// Service for support tickets
pub struct SupportService {
    storage: Arc<dyn Storage>,
}

impl SupportService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// List tickets visible to the caller: admins see everything, users see
    /// only their own.
    pub async fn list_for(&self, caller: &User) -> Result<Vec<Ticket>, AppError> {
        if caller.is_admin() {
            Ok(self.storage.get_tickets().await?)
        } else {
            Ok(self.storage.get_tickets_for_user(&caller.id).await?)
        }
    }

    /// Open a new ticket for the caller
    pub async fn open(
        &self,
        caller: &User,
        subject: &str,
        message: &str,
    ) -> Result<Ticket, AppError> {
        if subject.trim().is_empty() || message.trim().is_empty() {
            return Err(AppError::Domain(DomainError::Validation(
                "Ticket subject and message cannot be empty".to_string(),
            )));
        }

        Ok(self
            .storage
            .create_ticket(&NewTicket {
                user_id: caller.id.clone(),
                subject: subject.trim().to_string(),
                message: message.trim().to_string(),
            })
            .await?)
    }

    /// Reply to a ticket and close it (admin operation; one-shot)
    pub async fn reply(&self, id: &TicketId, reply: &str) -> Result<Ticket, AppError> {
        if reply.trim().is_empty() {
            return Err(AppError::Domain(DomainError::Validation(
                "Reply cannot be empty".to_string(),
            )));
        }

        Ok(self.storage.reply_to_ticket(id, reply.trim()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorage;
    use crate::domain::entities::TicketStatus;
    use crate::test_utils::{seeded_admin, seeded_user};

    fn service(storage: Arc<MemoryStorage>) -> SupportService {
        SupportService::new(storage)
    }

    #[tokio::test]
    async fn reply_closes_the_ticket_and_stores_the_reply() {
        let storage = Arc::new(MemoryStorage::new());
        let support = service(storage.clone());
        let user = seeded_user(storage.as_ref(), "neo", 0).await;
        let admin = seeded_admin(storage.as_ref(), "root").await;

        let ticket = support.open(&user, "Broken item", "No content arrived").await.unwrap();
        assert_eq!(ticket.status, TicketStatus::Open);

        let closed = support.reply(&ticket.id, "Re-delivered, sorry!").await.unwrap();
        assert_eq!(closed.status, TicketStatus::Closed);
        assert_eq!(closed.reply.as_deref(), Some("Re-delivered, sorry!"));

        // Still visible to the owner and to any admin.
        assert_eq!(support.list_for(&user).await.unwrap().len(), 1);
        assert_eq!(support.list_for(&admin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_reply_is_a_conflict() {
        let storage = Arc::new(MemoryStorage::new());
        let support = service(storage.clone());
        let user = seeded_user(storage.as_ref(), "neo", 0).await;

        let ticket = support.open(&user, "s", "m").await.unwrap();
        support.reply(&ticket.id, "first").await.unwrap();

        let err = support.reply(&ticket.id, "second").await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn listing_is_scoped_by_role() {
        let storage = Arc::new(MemoryStorage::new());
        let support = service(storage.clone());
        let alice = seeded_user(storage.as_ref(), "alice", 0).await;
        let bob = seeded_user(storage.as_ref(), "bob", 0).await;
        let admin = seeded_admin(storage.as_ref(), "root").await;

        support.open(&alice, "a", "a").await.unwrap();
        support.open(&bob, "b1", "b").await.unwrap();
        support.open(&bob, "b2", "b").await.unwrap();

        assert_eq!(support.list_for(&alice).await.unwrap().len(), 1);
        assert_eq!(support.list_for(&bob).await.unwrap().len(), 2);
        assert_eq!(support.list_for(&admin).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let support = service(storage.clone());
        let user = seeded_user(storage.as_ref(), "neo", 0).await;

        assert!(support.open(&user, " ", "m").await.is_err());
        assert!(support.open(&user, "s", "").await.is_err());

        let ticket = support.open(&user, "s", "m").await.unwrap();
        assert!(support.reply(&ticket.id, "  ").await.is_err());
    }
}
