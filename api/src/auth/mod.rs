//! Authentication
//!
//! Bearer API-key middleware that resolves a key to a user principal.

pub mod api_key;

pub use api_key::{auth_middleware, optional_auth_middleware};
