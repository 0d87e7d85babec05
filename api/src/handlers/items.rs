//! Item handlers
//!
//! Catalog listing, the access-gated item read, admin item management,
//! and the purchase endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::{require_admin, MessageResponse};
use crate::domain::entities::{Delivery, Item, ItemId, NewItem, User};
use crate::error::AppError;
use crate::AppState;

/// Item metadata, without the purchasable content
#[derive(Debug, Serialize)]
pub struct ItemSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: String,
}

impl From<&Item> for ItemSummary {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.to_string(),
            title: item.title.clone(),
            description: item.description.clone(),
            price: item.price,
            kind: item.delivery.kind().to_string(),
            created_at: item.created_at.to_rfc3339(),
        }
    }
}

/// Request to create an item
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(flatten)]
    pub delivery: Delivery,
}

/// Response body for a purchase
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub message: String,
    pub content: String,
}

/// GET /api/items
///
/// List the catalog. Public; content is stripped.
pub async fn list_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<ItemSummary>>, AppError> {
    let items = state.catalog_service.list_items().await?;
    Ok(Json(items.iter().map(ItemSummary::from).collect()))
}

/// GET /api/items/:id
///
/// Fetch one item including its content. Free items are visible to anyone;
/// paid items require a prior purchase by the caller.
pub async fn get_item(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
    Path(id): Path<String>,
) -> Result<Json<Item>, AppError> {
    let viewer = user.as_ref().map(|Extension(u)| u);
    let item = state
        .catalog_service
        .item_for(viewer, &ItemId::from(id))
        .await?;
    Ok(Json(item))
}

/// POST /api/items
///
/// Add an item to the catalog (admin only).
pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    require_admin(&user)?;

    let item = state
        .catalog_service
        .create_item(NewItem {
            title: request.title,
            description: request.description,
            price: request.price,
            delivery: request.delivery,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// DELETE /api/items/:id
///
/// Remove an item (admin only). Past purchases keep their content.
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    require_admin(&user)?;

    state.catalog_service.delete_item(&ItemId::from(id)).await?;

    Ok(Json(MessageResponse {
        message: "Item deleted".to_string(),
    }))
}

/// POST /api/items/:id/purchase
///
/// Buy an item and receive its content.
pub async fn purchase_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let content = state
        .catalog_service
        .purchase(&user.id, &ItemId::from(id))
        .await?;

    Ok(Json(PurchaseResponse {
        message: "Purchase successful".to_string(),
        content,
    }))
}
