//! Storage port
//!
//! The single persistence capability behind the business rules. Selected at
//! startup (in-memory or Postgres) and behaviorally identical to callers.
//! One method family per entity; ids are opaque strings allocated by the
//! implementation.

use async_trait::async_trait;

use crate::domain::entities::{
    Item, ItemId, NewItem, NewPurchase, NewTicket, NewTransaction, NewUser, Purchase, RedeemCode,
    Ticket, TicketId, Transaction, TransactionId, TransactionStatus, User, UserId,
};
use crate::error::DomainError;

#[async_trait]
pub trait Storage: Send + Sync {
    // Users

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;

    async fn get_user_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError>;

    /// Create a user. Fails with `Conflict` if the username is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User, DomainError>;

    /// Overwrite a user's credit balance. Fails with `NotFound` if the id
    /// does not resolve and `Validation` if the new balance is negative.
    async fn update_user_credits(&self, id: &UserId, credits: i64) -> Result<User, DomainError>;

    async fn count_users(&self) -> Result<u64, DomainError>;

    // Items

    async fn get_items(&self) -> Result<Vec<Item>, DomainError>;

    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>, DomainError>;

    async fn create_item(&self, item: &NewItem) -> Result<Item, DomainError>;

    /// Remove an item. Fails with `NotFound` if the id does not resolve.
    /// Existing purchase records are untouched.
    async fn delete_item(&self, id: &ItemId) -> Result<(), DomainError>;

    // Transactions

    async fn get_transactions(&self) -> Result<Vec<Transaction>, DomainError>;

    /// Create a transaction with status `pending`.
    async fn create_transaction(&self, tx: &NewTransaction) -> Result<Transaction, DomainError>;

    /// Atomically move a transaction from `pending` to `approved` or
    /// `rejected`. Fails with `NotFound` if the id does not resolve and
    /// `Conflict` if the transaction is already resolved.
    async fn resolve_transaction(
        &self,
        id: &TransactionId,
        status: TransactionStatus,
    ) -> Result<Transaction, DomainError>;

    /// Overwrite a transaction's amount, regardless of status.
    async fn update_transaction_amount(
        &self,
        id: &TransactionId,
        amount: i64,
    ) -> Result<Transaction, DomainError>;

    // Tickets

    async fn get_tickets(&self) -> Result<Vec<Ticket>, DomainError>;

    async fn get_tickets_for_user(&self, user_id: &UserId) -> Result<Vec<Ticket>, DomainError>;

    /// Open a ticket with status `open`.
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, DomainError>;

    /// Atomically set the reply and flip the ticket to `closed`. Fails with
    /// `NotFound` if the id does not resolve and `Conflict` if the ticket
    /// is already closed.
    async fn reply_to_ticket(&self, id: &TicketId, reply: &str) -> Result<Ticket, DomainError>;

    // Purchases

    /// Append a purchase record to the log.
    async fn create_purchase(&self, purchase: &NewPurchase) -> Result<Purchase, DomainError>;

    async fn has_purchased(&self, user_id: &UserId, item_id: &ItemId)
        -> Result<bool, DomainError>;

    /// Number of purchase records for (user, item); the sequential-delivery
    /// cursor.
    async fn count_purchases(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> Result<u64, DomainError>;

    // Redeem codes

    /// Store a freshly generated code with `is_used = false`.
    async fn create_redeem_code(&self, code: &str, value: i64)
        -> Result<RedeemCode, DomainError>;

    /// Atomically find an unused code by its token and mark it used by
    /// `user_id` (compare-and-set on `is_used`). Fails with
    /// `Validation("Invalid or used code")` if the token does not resolve or
    /// the code was already claimed; exactly one of two concurrent claims
    /// can succeed.
    async fn claim_redeem_code(
        &self,
        code: &str,
        user_id: &UserId,
    ) -> Result<RedeemCode, DomainError>;
}
