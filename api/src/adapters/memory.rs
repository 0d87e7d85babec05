//! In-memory storage adapter
//!
//! Ephemeral fallback used when no database is configured, and the backing
//! store for service tests. Ids come from a monotonically increasing
//! per-store counter, exposed to callers as opaque strings.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::entities::{
    Item, ItemId, NewItem, NewPurchase, NewTicket, NewTransaction, NewUser, Purchase, PurchaseId,
    RedeemCode, RedeemCodeId, Ticket, TicketId, TicketStatus, Transaction, TransactionId,
    TransactionStatus, User, UserId,
};
use crate::domain::ports::Storage;
use crate::error::DomainError;

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    items: HashMap<ItemId, Item>,
    transactions: HashMap<TransactionId, Transaction>,
    tickets: HashMap<TicketId, Ticket>,
    purchases: Vec<Purchase>,
    redeem_codes: HashMap<RedeemCodeId, RedeemCode>,
    next_id: u64,
}

impl Inner {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }
}

/// Ephemeral implementation of [`Storage`]
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("storage lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("storage lock poisoned")
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.read().users.get(id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_user_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.api_key_hash == hash)
            .cloned())
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User, DomainError> {
        let mut inner = self.write();
        if inner.users.values().any(|u| u.username == new_user.username) {
            return Err(DomainError::Conflict(format!(
                "Username '{}' is already taken",
                new_user.username
            )));
        }

        let id = UserId(inner.allocate_id());
        let user = User {
            id: id.clone(),
            username: new_user.username.clone(),
            api_key_hash: new_user.api_key_hash.clone(),
            role: new_user.role,
            credits: 0,
            created_at: Utc::now(),
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_user_credits(&self, id: &UserId, credits: i64) -> Result<User, DomainError> {
        if credits < 0 {
            return Err(DomainError::Validation(
                "Credit balance cannot go negative".to_string(),
            ));
        }

        let mut inner = self.write();
        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("User {}", id)))?;
        user.credits = credits;
        Ok(user.clone())
    }

    async fn count_users(&self) -> Result<u64, DomainError> {
        Ok(self.read().users.len() as u64)
    }

    async fn get_items(&self) -> Result<Vec<Item>, DomainError> {
        Ok(self.read().items.values().cloned().collect())
    }

    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>, DomainError> {
        Ok(self.read().items.get(id).cloned())
    }

    async fn create_item(&self, new_item: &NewItem) -> Result<Item, DomainError> {
        let mut inner = self.write();
        let id = ItemId(inner.allocate_id());
        let item = Item {
            id: id.clone(),
            title: new_item.title.clone(),
            description: new_item.description.clone(),
            price: new_item.price,
            delivery: new_item.delivery.clone(),
            created_at: Utc::now(),
        };
        inner.items.insert(id, item.clone());
        Ok(item)
    }

    async fn delete_item(&self, id: &ItemId) -> Result<(), DomainError> {
        self.write()
            .items
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("Item {}", id)))
    }

    async fn get_transactions(&self) -> Result<Vec<Transaction>, DomainError> {
        Ok(self.read().transactions.values().cloned().collect())
    }

    async fn create_transaction(
        &self,
        new_tx: &NewTransaction,
    ) -> Result<Transaction, DomainError> {
        let mut inner = self.write();
        let id = TransactionId(inner.allocate_id());
        let tx = Transaction {
            id: id.clone(),
            user_id: new_tx.user_id.clone(),
            reference: new_tx.reference.clone(),
            amount: new_tx.amount,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
        };
        inner.transactions.insert(id, tx.clone());
        Ok(tx)
    }

    async fn resolve_transaction(
        &self,
        id: &TransactionId,
        status: TransactionStatus,
    ) -> Result<Transaction, DomainError> {
        let mut inner = self.write();
        let tx = inner
            .transactions
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Transaction {}", id)))?;
        if tx.is_resolved() {
            return Err(DomainError::Conflict(format!(
                "Transaction {} is already {}",
                id, tx.status
            )));
        }
        tx.status = status;
        Ok(tx.clone())
    }

    async fn update_transaction_amount(
        &self,
        id: &TransactionId,
        amount: i64,
    ) -> Result<Transaction, DomainError> {
        let mut inner = self.write();
        let tx = inner
            .transactions
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Transaction {}", id)))?;
        tx.amount = amount;
        Ok(tx.clone())
    }

    async fn get_tickets(&self) -> Result<Vec<Ticket>, DomainError> {
        Ok(self.read().tickets.values().cloned().collect())
    }

    async fn get_tickets_for_user(&self, user_id: &UserId) -> Result<Vec<Ticket>, DomainError> {
        Ok(self
            .read()
            .tickets
            .values()
            .filter(|t| t.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    async fn create_ticket(&self, new_ticket: &NewTicket) -> Result<Ticket, DomainError> {
        let mut inner = self.write();
        let id = TicketId(inner.allocate_id());
        let ticket = Ticket {
            id: id.clone(),
            user_id: new_ticket.user_id.clone(),
            subject: new_ticket.subject.clone(),
            message: new_ticket.message.clone(),
            status: TicketStatus::Open,
            reply: None,
            created_at: Utc::now(),
        };
        inner.tickets.insert(id, ticket.clone());
        Ok(ticket)
    }

    async fn reply_to_ticket(&self, id: &TicketId, reply: &str) -> Result<Ticket, DomainError> {
        let mut inner = self.write();
        let ticket = inner
            .tickets
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Ticket {}", id)))?;
        if ticket.is_closed() {
            return Err(DomainError::Conflict(format!(
                "Ticket {} is already closed",
                id
            )));
        }
        ticket.reply = Some(reply.to_string());
        ticket.status = TicketStatus::Closed;
        Ok(ticket.clone())
    }

    async fn create_purchase(&self, new_purchase: &NewPurchase) -> Result<Purchase, DomainError> {
        let mut inner = self.write();
        let id = PurchaseId(inner.allocate_id());
        let purchase = Purchase {
            id,
            user_id: new_purchase.user_id.clone(),
            item_id: new_purchase.item_id.clone(),
            content: new_purchase.content.clone(),
            created_at: Utc::now(),
        };
        inner.purchases.push(purchase.clone());
        Ok(purchase)
    }

    async fn has_purchased(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> Result<bool, DomainError> {
        Ok(self
            .read()
            .purchases
            .iter()
            .any(|p| &p.user_id == user_id && &p.item_id == item_id))
    }

    async fn count_purchases(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> Result<u64, DomainError> {
        Ok(self
            .read()
            .purchases
            .iter()
            .filter(|p| &p.user_id == user_id && &p.item_id == item_id)
            .count() as u64)
    }

    async fn create_redeem_code(
        &self,
        code: &str,
        value: i64,
    ) -> Result<RedeemCode, DomainError> {
        let mut inner = self.write();
        let id = RedeemCodeId(inner.allocate_id());
        let redeem_code = RedeemCode {
            id: id.clone(),
            code: code.to_string(),
            value,
            is_used: false,
            used_by: None,
            created_at: Utc::now(),
        };
        inner.redeem_codes.insert(id, redeem_code.clone());
        Ok(redeem_code)
    }

    async fn claim_redeem_code(
        &self,
        code: &str,
        user_id: &UserId,
    ) -> Result<RedeemCode, DomainError> {
        // Single write-lock section: the lookup and the used-flag flip are
        // one atomic step, so a code can only ever be claimed once.
        let mut inner = self.write();
        let redeem_code = inner
            .redeem_codes
            .values_mut()
            .find(|rc| rc.code == code)
            .filter(|rc| !rc.is_used)
            .ok_or_else(|| DomainError::Validation("Invalid or used code".to_string()))?;
        redeem_code.is_used = true;
        redeem_code.used_by = Some(user_id.clone());
        Ok(redeem_code.clone())
    }
}
