//! # wasatext-service
//!
//! The conversation service: the single orchestrator over the WASAText
//! stores. It resolves identities from security keys, gates every
//! chat-scoped operation on membership, and owns every transaction that
//! touches more than one row (chat creation with its members, message send
//! with its delivery-status fan-out, forwarding, deletion).
//!
//! Transport concerns (HTTP routing, bearer parsing, JSON envelopes) live
//! outside this crate; every public operation returns either a value or a
//! [`ServiceError`] with a stable [`ErrorKind`].

pub mod config;
pub mod error;
pub mod handle;
pub mod service;
pub mod views;

pub use config::ServiceConfig;
pub use error::{ErrorKind, ServiceError};
pub use handle::AsyncConversationService;
pub use service::ConversationService;
pub use views::{Conversation, LoginOutcome, MessageView, OutgoingMessage};
