//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod item;
pub mod purchase;
pub mod redeem_code;
pub mod ticket;
pub mod transaction;
pub mod user;

pub use item::{Delivery, Item, ItemId, NewItem};
pub use purchase::{NewPurchase, Purchase, PurchaseId};
pub use redeem_code::{normalize_code, RedeemCode, RedeemCodeId, CODE_TOKEN_BYTES};
pub use ticket::{NewTicket, Ticket, TicketId, TicketStatus};
pub use transaction::{NewTransaction, Transaction, TransactionId, TransactionStatus};
pub use user::{NewUser, Role, User, UserId};
