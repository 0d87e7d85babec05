//! Account service
//!
//! Handles user registration and API-key authentication lookup.

use std::sync::Arc;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::domain::entities::{NewUser, Role, User};
use crate::domain::ports::Storage;
use crate::error::{AppError, DomainError};

/// Service for managing user accounts
pub struct AccountService {
    storage: Arc<dyn Storage>,
}

impl AccountService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Register a new user.
    ///
    /// The very first account becomes the admin; everyone after that is a
    /// regular user. Returns (user, api_key) - the key is only shown once
    /// and stored hashed.
    pub async fn register(&self, username: &str) -> Result<(User, String), AppError> {
        let username = username.trim();
        if username.is_empty() || username.len() > 50 {
            return Err(AppError::Domain(DomainError::Validation(
                "Username must be between 1 and 50 characters".to_string(),
            )));
        }

        if self.storage.get_user_by_username(username).await?.is_some() {
            return Err(AppError::Domain(DomainError::Conflict(format!(
                "Username '{}' is already taken",
                username
            ))));
        }

        let api_key = generate_api_key();
        let role = if self.storage.count_users().await? == 0 {
            Role::Admin
        } else {
            Role::User
        };

        let user = self
            .storage
            .create_user(&NewUser {
                username: username.to_string(),
                api_key_hash: hash_api_key(&api_key),
                role,
            })
            .await?;

        Ok((user, api_key))
    }

    /// Find a user by their API key hash
    pub async fn find_by_api_key(&self, api_key_hash: &str) -> Result<Option<User>, AppError> {
        Ok(self.storage.get_user_by_api_key_hash(api_key_hash).await?)
    }
}

/// Generate a random API key
fn generate_api_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!("gm-{}", hex::encode(bytes))
}

/// Hash an API key for storage
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorage;

    fn service() -> AccountService {
        AccountService::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn first_user_becomes_admin() {
        let service = service();
        let (admin, _) = service.register("root").await.unwrap();
        let (user, _) = service.register("neo").await.unwrap();

        assert_eq!(admin.role, Role::Admin);
        assert_eq!(user.role, Role::User);
        assert_eq!(user.credits, 0);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let service = service();
        service.register("neo").await.unwrap();
        let err = service.register("neo").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn blank_username_is_rejected() {
        let service = service();
        assert!(service.register("   ").await.is_err());
        assert!(service.register(&"x".repeat(51)).await.is_err());
    }

    #[tokio::test]
    async fn api_key_resolves_back_to_the_user() {
        let service = service();
        let (user, api_key) = service.register("neo").await.unwrap();

        let found = service
            .find_by_api_key(&hash_api_key(&api_key))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);

        assert!(service
            .find_by_api_key(&hash_api_key("gm-wrong"))
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn api_keys_are_unique_and_hashed() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert_ne!(a, b);
        assert!(a.starts_with("gm-"));
        assert_eq!(hash_api_key(&a).len(), 64);
        assert_ne!(hash_api_key(&a), hash_api_key(&b));
    }
}
