//! # wasatext-shared
//!
//! Types shared by the WASAText store and service crates: surrogate id
//! newtypes, protocol limits, input validation and security-key generation.

pub mod constants;
pub mod error;
pub mod identity;
pub mod types;
pub mod validation;

pub use error::ValidationError;
pub use types::{ChatId, MessageId, UserId};
