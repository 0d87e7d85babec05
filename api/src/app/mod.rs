//! Application layer
//!
//! Contains use cases and service orchestration. Services coordinate
//! between domain entities and the storage port.

pub mod account_service;
pub mod billing_service;
pub mod catalog_service;
pub mod locks;
pub mod support_service;

pub use account_service::{hash_api_key, AccountService};
pub use billing_service::BillingService;
pub use catalog_service::CatalogService;
pub use locks::UserLocks;
pub use support_service::SupportService;
