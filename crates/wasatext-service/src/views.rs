//! Values returned by (and handed to) the conversation service.
//!
//! Field names serialize as written (snake_case), the same as the store
//! models they embed.

use serde::Serialize;
use wasatext_shared::UserId;
use wasatext_store::{Chat, Comment, Message};

/// Result of a login: the caller's identity and bearer key.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user_id: UserId,
    pub username: String,
    pub security_key: String,
    /// `true` when this login created the account.
    pub created: bool,
}

/// Body of a message about to be sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutgoingMessage<'a> {
    pub text: Option<&'a str>,
    pub media: Option<&'a [u8]>,
    pub forwarded: bool,
}

impl<'a> OutgoingMessage<'a> {
    pub fn text(text: &'a str) -> Self {
        Self {
            text: Some(text),
            ..Self::default()
        }
    }

    pub fn media(media: &'a [u8]) -> Self {
        Self {
            media: Some(media),
            ..Self::default()
        }
    }
}

/// A message together with its comments and read receipts.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub comments: Vec<Comment>,
    pub seen_by: Vec<UserId>,
}

/// A chat with its members and full history, oldest message first.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Conversation {
    pub chat: Chat,
    pub members: Vec<UserId>,
    pub messages: Vec<MessageView>,
}
