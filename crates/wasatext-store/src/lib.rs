//! # wasatext-store
//!
//! Relational storage for WASAText, backed by SQLite.
//!
//! The crate exposes a pooled [`Database`] handle plus four borrowed store
//! views ([`Users`], [`Chats`], [`Messages`], [`Statuses`]). Each view wraps a
//! plain `&rusqlite::Connection`, so the same queries run either on a pooled
//! connection or inside a transaction opened by the caller. The stores never
//! begin transactions themselves and never check cross-entity invariants
//! such as membership; that is the orchestrator's job.

pub mod chats;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod statuses;
pub mod users;

mod error;

pub use chats::Chats;
pub use database::{Database, DatabaseOptions};
pub use error::{Result, StoreError};
pub use messages::Messages;
pub use models::*;
pub use statuses::Statuses;
pub use users::Users;
