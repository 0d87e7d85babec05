//! SeaORM table models
//!
//! Persistence-shaped rows for the Postgres adapter. Domain conversions
//! live next to the adapter, not here.

pub mod items;
pub mod purchases;
pub mod redeem_codes;
pub mod tickets;
pub mod transactions;
pub mod users;
