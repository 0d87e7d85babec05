//! Test utilities
//!
//! Shared fixtures for service and integration tests.

pub mod fixtures;

pub use fixtures::{full_item, seeded_admin, seeded_user, sequential_item};
