//! Adapters layer
//!
//! Implementations of the storage port: an ephemeral in-memory store and a
//! durable PostgreSQL store, selected at startup.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;
