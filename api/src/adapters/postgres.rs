//! PostgreSQL storage adapter
//!
//! Durable implementation of the [`Storage`] port over SeaORM. Ids are
//! UUIDv4 strings, so they stay opaque and stable next to the in-memory
//! counter ids.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    Delivery, Item, ItemId, NewItem, NewPurchase, NewTicket, NewTransaction, NewUser, Purchase,
    PurchaseId, RedeemCode, RedeemCodeId, Role, Ticket, TicketId, TicketStatus, Transaction,
    TransactionId, TransactionStatus, User, UserId,
};
use crate::domain::ports::Storage;
use crate::entity::{items, purchases, redeem_codes, tickets, transactions, users};
use crate::error::DomainError;

/// Durable implementation of [`Storage`]
pub struct PostgresStorage {
    db: DatabaseConnection,
}

impl PostgresStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_err(e: DbErr) -> DomainError {
    DomainError::Database(e.to_string())
}

/// Map the error of a keyed `ActiveModel::update`. SeaORM reports an
/// update that matched no row as `RecordNotUpdated` (not `RecordNotFound`),
/// and both mean the id did not resolve.
fn update_err(e: DbErr, what: String) -> DomainError {
    match e {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => DomainError::NotFound(what),
        e => db_err(e),
    }
}

fn allocate_id() -> String {
    Uuid::new_v4().to_string()
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find_by_id(id.0.clone())
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.map(|m| m.into()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.map(|m| m.into()))
    }

    async fn get_user_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find()
            .filter(users::Column::ApiKeyHash.eq(hash))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.map(|m| m.into()))
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User, DomainError> {
        if self.get_user_by_username(&new_user.username).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "Username '{}' is already taken",
                new_user.username
            )));
        }

        let model = users::ActiveModel {
            id: Set(allocate_id()),
            username: Set(new_user.username.clone()),
            api_key_hash: Set(new_user.api_key_hash.clone()),
            role: Set(new_user.role.to_string()),
            credits: Set(0),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model.insert(&self.db).await.map_err(db_err)?;
        Ok(result.into())
    }

    async fn update_user_credits(&self, id: &UserId, credits: i64) -> Result<User, DomainError> {
        if credits < 0 {
            return Err(DomainError::Validation(
                "Credit balance cannot go negative".to_string(),
            ));
        }

        let result = users::ActiveModel {
            id: Set(id.0.clone()),
            credits: Set(credits),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| update_err(e, format!("User {}", id)))?;

        Ok(result.into())
    }

    async fn count_users(&self) -> Result<u64, DomainError> {
        users::Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn get_items(&self) -> Result<Vec<Item>, DomainError> {
        let results = items::Entity::find().all(&self.db).await.map_err(db_err)?;
        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>, DomainError> {
        let result = items::Entity::find_by_id(id.0.clone())
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.map(|m| m.into()))
    }

    async fn create_item(&self, new_item: &NewItem) -> Result<Item, DomainError> {
        let (content, contents) = match &new_item.delivery {
            Delivery::Full { content } => (Some(content.clone()), None),
            Delivery::Sequential { contents } => (
                None,
                Some(serde_json::to_value(contents).map_err(|e| {
                    DomainError::Database(format!("Failed to encode item contents: {}", e))
                })?),
            ),
        };

        let model = items::ActiveModel {
            id: Set(allocate_id()),
            title: Set(new_item.title.clone()),
            description: Set(new_item.description.clone()),
            price: Set(new_item.price),
            kind: Set(new_item.delivery.kind().to_string()),
            content: Set(content),
            contents: Set(contents),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model.insert(&self.db).await.map_err(db_err)?;
        Ok(result.into())
    }

    async fn delete_item(&self, id: &ItemId) -> Result<(), DomainError> {
        let result = items::Entity::delete_by_id(id.0.clone())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Item {}", id)));
        }
        Ok(())
    }

    async fn get_transactions(&self) -> Result<Vec<Transaction>, DomainError> {
        let results = transactions::Entity::find()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create_transaction(
        &self,
        new_tx: &NewTransaction,
    ) -> Result<Transaction, DomainError> {
        let model = transactions::ActiveModel {
            id: Set(allocate_id()),
            user_id: Set(new_tx.user_id.0.clone()),
            reference: Set(new_tx.reference.clone()),
            amount: Set(new_tx.amount),
            status: Set(TransactionStatus::Pending.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model.insert(&self.db).await.map_err(db_err)?;
        Ok(result.into())
    }

    async fn resolve_transaction(
        &self,
        id: &TransactionId,
        status: TransactionStatus,
    ) -> Result<Transaction, DomainError> {
        let found = transactions::Entity::find_by_id(id.0.clone())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::NotFound(format!("Transaction {}", id)))?;

        // Conditional update: only a still-pending row can be resolved, so
        // two concurrent resolutions cannot both win.
        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::Status, Expr::value(status.to_string()))
            .filter(transactions::Column::Id.eq(id.0.clone()))
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending.to_string()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::Conflict(format!(
                "Transaction {} is already {}",
                id, found.status
            )));
        }

        // Re-read after the flip so a concurrent amount update between the
        // find and the CAS is reflected in the returned record.
        let updated = transactions::Entity::find_by_id(id.0.clone())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::NotFound(format!("Transaction {}", id)))?;
        Ok(updated.into())
    }

    async fn update_transaction_amount(
        &self,
        id: &TransactionId,
        amount: i64,
    ) -> Result<Transaction, DomainError> {
        let result = transactions::ActiveModel {
            id: Set(id.0.clone()),
            amount: Set(amount),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| update_err(e, format!("Transaction {}", id)))?;

        Ok(result.into())
    }

    async fn get_tickets(&self) -> Result<Vec<Ticket>, DomainError> {
        let results = tickets::Entity::find()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn get_tickets_for_user(&self, user_id: &UserId) -> Result<Vec<Ticket>, DomainError> {
        let results = tickets::Entity::find()
            .filter(tickets::Column::UserId.eq(user_id.0.clone()))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create_ticket(&self, new_ticket: &NewTicket) -> Result<Ticket, DomainError> {
        let model = tickets::ActiveModel {
            id: Set(allocate_id()),
            user_id: Set(new_ticket.user_id.0.clone()),
            subject: Set(new_ticket.subject.clone()),
            message: Set(new_ticket.message.clone()),
            status: Set(TicketStatus::Open.to_string()),
            reply: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model.insert(&self.db).await.map_err(db_err)?;
        Ok(result.into())
    }

    async fn reply_to_ticket(&self, id: &TicketId, reply: &str) -> Result<Ticket, DomainError> {
        let found = tickets::Entity::find_by_id(id.0.clone())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::NotFound(format!("Ticket {}", id)))?;

        // Reply and close in one conditional update; a closed ticket never
        // transitions again.
        let result = tickets::Entity::update_many()
            .col_expr(
                tickets::Column::Status,
                Expr::value(TicketStatus::Closed.to_string()),
            )
            .col_expr(tickets::Column::Reply, Expr::value(Some(reply.to_string())))
            .filter(tickets::Column::Id.eq(id.0.clone()))
            .filter(tickets::Column::Status.eq(TicketStatus::Open.to_string()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::Conflict(format!(
                "Ticket {} is already closed",
                id
            )));
        }

        let mut ticket: Ticket = found.into();
        ticket.status = TicketStatus::Closed;
        ticket.reply = Some(reply.to_string());
        Ok(ticket)
    }

    async fn create_purchase(&self, new_purchase: &NewPurchase) -> Result<Purchase, DomainError> {
        let model = purchases::ActiveModel {
            id: Set(allocate_id()),
            user_id: Set(new_purchase.user_id.0.clone()),
            item_id: Set(new_purchase.item_id.0.clone()),
            content: Set(new_purchase.content.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model.insert(&self.db).await.map_err(db_err)?;
        Ok(result.into())
    }

    async fn has_purchased(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> Result<bool, DomainError> {
        Ok(self.count_purchases(user_id, item_id).await? > 0)
    }

    async fn count_purchases(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> Result<u64, DomainError> {
        purchases::Entity::find()
            .filter(purchases::Column::UserId.eq(user_id.0.clone()))
            .filter(purchases::Column::ItemId.eq(item_id.0.clone()))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn create_redeem_code(
        &self,
        code: &str,
        value: i64,
    ) -> Result<RedeemCode, DomainError> {
        let model = redeem_codes::ActiveModel {
            id: Set(allocate_id()),
            code: Set(code.to_string()),
            value: Set(value),
            is_used: Set(false),
            used_by: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model.insert(&self.db).await.map_err(db_err)?;
        Ok(result.into())
    }

    async fn claim_redeem_code(
        &self,
        code: &str,
        user_id: &UserId,
    ) -> Result<RedeemCode, DomainError> {
        let found = redeem_codes::Entity::find()
            .filter(redeem_codes::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::Validation("Invalid or used code".to_string()))?;

        // Compare-and-set on is_used: of two concurrent claims only one
        // update matches the unused row.
        let result = redeem_codes::Entity::update_many()
            .col_expr(redeem_codes::Column::IsUsed, Expr::value(true))
            .col_expr(
                redeem_codes::Column::UsedBy,
                Expr::value(Some(user_id.0.clone())),
            )
            .filter(redeem_codes::Column::Id.eq(found.id.clone()))
            .filter(redeem_codes::Column::IsUsed.eq(false))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::Validation("Invalid or used code".to_string()));
        }

        let mut redeem_code: RedeemCode = found.into();
        redeem_code.is_used = true;
        redeem_code.used_by = Some(user_id.clone());
        Ok(redeem_code)
    }
}

/// Convert SeaORM models to domain entities

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        User {
            id: UserId(model.id),
            username: model.username,
            api_key_hash: model.api_key_hash,
            role: model.role.parse().unwrap_or(Role::User),
            credits: model.credits,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<items::Model> for Item {
    fn from(model: items::Model) -> Self {
        let delivery = match model.kind.as_str() {
            "sequential" => Delivery::Sequential {
                contents: model
                    .contents
                    .and_then(|v| serde_json::from_value(v).ok())
                    .unwrap_or_default(),
            },
            _ => Delivery::Full {
                content: model.content.unwrap_or_default(),
            },
        };

        Item {
            id: ItemId(model.id),
            title: model.title,
            description: model.description,
            price: model.price,
            delivery,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<transactions::Model> for Transaction {
    fn from(model: transactions::Model) -> Self {
        Transaction {
            id: TransactionId(model.id),
            user_id: UserId(model.user_id),
            reference: model.reference,
            amount: model.amount,
            status: model.status.parse().unwrap_or(TransactionStatus::Pending),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<tickets::Model> for Ticket {
    fn from(model: tickets::Model) -> Self {
        Ticket {
            id: TicketId(model.id),
            user_id: UserId(model.user_id),
            subject: model.subject,
            message: model.message,
            status: model.status.parse().unwrap_or(TicketStatus::Open),
            reply: model.reply,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<purchases::Model> for Purchase {
    fn from(model: purchases::Model) -> Self {
        Purchase {
            id: PurchaseId(model.id),
            user_id: UserId(model.user_id),
            item_id: ItemId(model.item_id),
            content: model.content,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<redeem_codes::Model> for RedeemCode {
    fn from(model: redeem_codes::Model) -> Self {
        RedeemCode {
            id: RedeemCodeId(model.id),
            code: model.code,
            value: model.value,
            is_used: model.is_used,
            used_by: model.used_by.map(UserId),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
