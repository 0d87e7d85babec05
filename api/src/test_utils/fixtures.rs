//! Test fixtures
//!
//! Helpers that seed a storage backend with well-known users and items.

use crate::domain::entities::{Delivery, Item, NewItem, NewUser, Role, User};
use crate::domain::ports::Storage;

/// Create a regular user with the given credit balance
pub async fn seeded_user(storage: &dyn Storage, username: &str, credits: i64) -> User {
    let user = storage
        .create_user(&NewUser {
            username: username.to_string(),
            api_key_hash: format!("hash-{}", username),
            role: Role::User,
        })
        .await
        .unwrap();

    if credits > 0 {
        storage.update_user_credits(&user.id, credits).await.unwrap()
    } else {
        user
    }
}

/// Create an admin user
pub async fn seeded_admin(storage: &dyn Storage, username: &str) -> User {
    storage
        .create_user(&NewUser {
            username: username.to_string(),
            api_key_hash: format!("hash-{}", username),
            role: Role::Admin,
        })
        .await
        .unwrap()
}

/// Create a full-delivery item at the given price
pub async fn full_item(storage: &dyn Storage, price: i64) -> Item {
    storage
        .create_item(&NewItem {
            title: "Neon Sword".to_string(),
            description: "A glowing plasma blade.".to_string(),
            price,
            delivery: Delivery::Full {
                content: "You have unlocked the Neon Sword asset pack!".to_string(),
            },
        })
        .await
        .unwrap()
}

/// Create a sequential-delivery item with the given pages
pub async fn sequential_item(storage: &dyn Storage, price: i64, pages: &[&str]) -> Item {
    storage
        .create_item(&NewItem {
            title: "Hacker Manifesto".to_string(),
            description: "Serialized chapters, one per purchase.".to_string(),
            price,
            delivery: Delivery::Sequential {
                contents: pages.iter().map(|p| p.to_string()).collect(),
            },
        })
        .await
        .unwrap()
}
