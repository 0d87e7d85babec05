//! Catalog service
//!
//! Item management, the access-gated item read, and the purchase flow.

use std::sync::Arc;

use crate::app::locks::UserLocks;
use crate::domain::entities::{Delivery, Item, ItemId, NewItem, NewPurchase, User, UserId};
use crate::domain::ports::Storage;
use crate::error::{AppError, DomainError};

/// Service for the item catalog and purchases
pub struct CatalogService {
    storage: Arc<dyn Storage>,
    locks: Arc<UserLocks>,
}

impl CatalogService {
    pub fn new(storage: Arc<dyn Storage>, locks: Arc<UserLocks>) -> Self {
        Self { storage, locks }
    }

    /// List the whole catalog (metadata is public)
    pub async fn list_items(&self) -> Result<Vec<Item>, AppError> {
        Ok(self.storage.get_items().await?)
    }

    /// Fetch one item for a (possibly anonymous) viewer.
    ///
    /// Free items are always fully visible. Paid content requires an
    /// authenticated viewer with a recorded purchase; anyone else gets
    /// Forbidden.
    pub async fn item_for(
        &self,
        viewer: Option<&User>,
        id: &ItemId,
    ) -> Result<Item, AppError> {
        let mut item = self
            .storage
            .get_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {}", id)))?;

        if item.is_free() {
            return Ok(item);
        }

        let viewer = viewer.ok_or(AppError::Forbidden)?;
        if !self.storage.has_purchased(&viewer.id, id).await? {
            return Err(AppError::Domain(DomainError::Forbidden(
                "You must purchase this item first".to_string(),
            )));
        }

        // Sequential content is metered per purchase; the read shows only
        // the pages this viewer has already paid for.
        if let Delivery::Sequential { .. } = item.delivery {
            let delivered = self.storage.count_purchases(&viewer.id, id).await?;
            item.delivery = item.delivery.truncate(delivered as usize);
        }

        Ok(item)
    }

    /// Add an item to the catalog (admin operation; role enforced at the
    /// handler boundary)
    pub async fn create_item(&self, new_item: NewItem) -> Result<Item, AppError> {
        if new_item.title.trim().is_empty() {
            return Err(AppError::Domain(DomainError::Validation(
                "Item title cannot be empty".to_string(),
            )));
        }
        if new_item.price < 0 {
            return Err(AppError::Domain(DomainError::Validation(
                "Item price cannot be negative".to_string(),
            )));
        }
        if let Delivery::Sequential { contents } = &new_item.delivery {
            if contents.is_empty() {
                return Err(AppError::Domain(DomainError::Validation(
                    "Sequential items need at least one page".to_string(),
                )));
            }
        }

        Ok(self.storage.create_item(&new_item).await?)
    }

    /// Remove an item from the catalog. Existing purchases stay valid.
    pub async fn delete_item(&self, id: &ItemId) -> Result<(), AppError> {
        Ok(self.storage.delete_item(id).await?)
    }

    /// Purchase an item and return the delivered content.
    ///
    /// The whole debit-and-record sequence runs under the buyer's lock, so
    /// concurrent purchases by the same user cannot double-spend.
    pub async fn purchase(&self, buyer_id: &UserId, item_id: &ItemId) -> Result<String, AppError> {
        let _guard = self.locks.acquire(buyer_id).await;

        let user = self
            .storage
            .get_user(buyer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;
        let item = self
            .storage
            .get_item(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

        if !user.can_afford(item.price) {
            return Err(AppError::Domain(DomainError::Validation(
                "Insufficient credits".to_string(),
            )));
        }

        // Sequential items deliver the page after the last one this buyer
        // already received; full items always deliver their content.
        let delivered = self.storage.count_purchases(&user.id, &item.id).await?;
        let content = item
            .delivery
            .page(delivered as usize)
            .ok_or_else(|| {
                AppError::Domain(DomainError::Validation(
                    "All pages of this item have already been delivered".to_string(),
                ))
            })?
            .to_string();

        self.storage
            .update_user_credits(&user.id, user.credits - item.price)
            .await?;
        self.storage
            .create_purchase(&NewPurchase {
                user_id: user.id.clone(),
                item_id: item.id.clone(),
                content: content.clone(),
            })
            .await?;

        tracing::info!(user = %user.id, item = %item.id, price = item.price, "Purchase completed");
        Ok(content)
    }
}
