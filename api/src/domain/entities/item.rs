//! Item domain entity
//!
//! A purchasable digital item. Delivery is either one-shot (`full`) or an
//! ordered sequence of pages (`sequential`), modeled as a closed tagged
//! variant instead of the content/contents field duality of loosely typed
//! stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an item (opaque string, allocated by the store)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an item's content is delivered on purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Delivery {
    /// Single content string, delivered whole on every purchase
    Full { content: String },
    /// Ordered pages, delivered one per purchase
    Sequential { contents: Vec<String> },
}

impl Delivery {
    pub fn kind(&self) -> &'static str {
        match self {
            Delivery::Full { .. } => "full",
            Delivery::Sequential { .. } => "sequential",
        }
    }

    /// Content for the next purchase, given how many purchases the buyer
    /// has already made of this item. None when the sequence is exhausted.
    pub fn page(&self, already_delivered: usize) -> Option<&str> {
        match self {
            Delivery::Full { content } => Some(content),
            Delivery::Sequential { contents } => {
                contents.get(already_delivered).map(String::as_str)
            }
        }
    }

    /// Drop pages the buyer has not paid for yet. Full delivery is
    /// unaffected; sequential contents are cut down to the first
    /// `delivered` pages.
    pub fn truncate(self, delivered: usize) -> Self {
        match self {
            Delivery::Sequential { mut contents } => {
                contents.truncate(delivered);
                Delivery::Sequential { contents }
            }
            full => full,
        }
    }
}

/// A purchasable digital item
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    /// Invariant: never negative
    pub price: i64,
    #[serde(flatten)]
    pub delivery: Delivery,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn is_free(&self) -> bool {
        self.price == 0
    }
}

/// Data needed to create a new item
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub delivery: Delivery,
}
