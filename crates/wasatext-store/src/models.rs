//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a transport layer. Binary payloads (avatars, message media)
//! are never loaded into these structs; only a presence flag is carried and
//! the bytes are fetched separately.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use wasatext_shared::{ChatId, MessageId, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user. The security key is deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub has_avatar: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A conversation. `is_group` is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chat {
    pub id: ChatId,
    pub name: String,
    pub is_group: bool,
    pub has_avatar: bool,
    pub created_at: DateTime<Utc>,
}

/// One entry of a user's conversation list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatSummary {
    pub id: ChatId,
    pub name: String,
    pub is_group: bool,
    pub has_avatar: bool,
    /// Most recent message, if the chat has any.
    pub last_message: Option<MessagePreview>,
}

/// Short form of a message used in conversation lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagePreview {
    pub id: MessageId,
    pub sender_id: UserId,
    pub text: Option<String>,
    pub has_media: bool,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A stored chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub text: Option<String>,
    pub has_media: bool,
    pub forwarded: bool,
    pub timestamp: DateTime<Utc>,
}

/// Insert payload for [`Messages::insert`](crate::Messages::insert).
#[derive(Debug, Clone)]
pub struct NewMessage<'a> {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub text: Option<&'a str>,
    pub media: Option<&'a [u8]>,
    pub forwarded: bool,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Delivery status
// ---------------------------------------------------------------------------

/// Per-recipient progress of a message.
///
/// `Seen` implies the message was also received; the store never holds a
/// row that is seen but not sent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Pending,
    Received,
    Seen,
}

impl DeliveryState {
    pub fn from_flags(sent: bool, seen: bool) -> Self {
        match (sent, seen) {
            (_, true) => DeliveryState::Seen,
            (true, false) => DeliveryState::Received,
            (false, false) => DeliveryState::Pending,
        }
    }
}

/// The status row for one (message, recipient) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryStatus {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub sent: bool,
    pub seen: bool,
    /// Empty string means "no comment".
    pub comment: String,
}

impl DeliveryStatus {
    pub fn state(&self) -> DeliveryState {
        DeliveryState::from_flags(self.sent, self.seen)
    }
}

/// A non-empty comment (reaction) left on a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub user_id: UserId,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Timestamps are stored as fixed-width RFC-3339 text so that lexical order
/// matches chronological order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, reporting the column index on failure.
pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
