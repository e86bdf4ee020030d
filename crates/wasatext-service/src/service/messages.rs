use chrono::Utc;
use rusqlite::Connection;
use wasatext_shared::validation::{validate_comment, validate_message_body};
use wasatext_shared::{ChatId, MessageId, UserId};
use wasatext_store::{Chats, DeliveryStatus, Message, Messages, NewMessage, Statuses};

use super::{authenticate, missing, require_member, ConversationService};
use crate::error::ServiceError;
use crate::views::{MessageView, OutgoingMessage};

impl ConversationService {
    /// Send a message and fan out one pending delivery status per current
    /// member, the sender included. Message and statuses commit together.
    pub fn send_message(
        &self,
        key: &str,
        chat: ChatId,
        body: &OutgoingMessage<'_>,
    ) -> Result<MessageId, ServiceError> {
        validate_message_body(body.text, body.media)?;
        let body = OutgoingMessage {
            text: body.text.filter(|t| !t.trim().is_empty()),
            media: body.media.filter(|m| !m.is_empty()),
            forwarded: body.forwarded,
        };

        self.write("send_message", |conn| {
            let me = authenticate(conn, key)?;
            require_member(conn, me, chat)?;
            deliver(conn, chat, me, &body)
        })
        .map_err(send_failed)
    }

    /// Copy a message into another chat the requester belongs to. The copy
    /// is marked forwarded and gets its own fan-out.
    pub fn forward_message(
        &self,
        key: &str,
        message: MessageId,
        target: ChatId,
    ) -> Result<MessageId, ServiceError> {
        self.write("forward_message", |conn| {
            let me = authenticate(conn, key)?;
            message_chat(conn, me, message)?;
            require_member(conn, me, target)?;

            let messages = Messages::new(conn);
            let original = messages.get(message).map_err(missing("message"))?;
            let media = messages.media(message).map_err(missing("message"))?;
            let body = OutgoingMessage {
                text: original.text.as_deref(),
                media: media.as_deref(),
                forwarded: true,
            };
            deliver(conn, target, me, &body)
        })
        .map_err(send_failed)
    }

    /// One message with its comments and read receipts.
    pub fn message(&self, key: &str, message: MessageId) -> Result<MessageView, ServiceError> {
        self.read("message", |conn| {
            let me = authenticate(conn, key)?;
            message_chat(conn, me, message)?;
            let stored = Messages::new(conn).get(message).map_err(missing("message"))?;
            message_view(conn, stored)
        })
    }

    pub fn message_media(
        &self,
        key: &str,
        message: MessageId,
    ) -> Result<Option<Vec<u8>>, ServiceError> {
        self.read("message_media", |conn| {
            let me = authenticate(conn, key)?;
            message_chat(conn, me, message)?;
            Messages::new(conn).media(message).map_err(missing("message"))
        })
    }

    /// Every delivery status row of a message, ordered by user id.
    pub fn message_statuses(
        &self,
        key: &str,
        message: MessageId,
    ) -> Result<Vec<DeliveryStatus>, ServiceError> {
        self.read("message_statuses", |conn| {
            let me = authenticate(conn, key)?;
            message_chat(conn, me, message)?;
            Ok(Statuses::new(conn).list_for_message(message)?)
        })
    }

    /// Delete one of the requester's own messages; its statuses go with it.
    pub fn delete_message(&self, key: &str, message: MessageId) -> Result<(), ServiceError> {
        self.write("delete_message", |conn| {
            let me = authenticate(conn, key)?;
            let chat = message_chat(conn, me, message)?;

            let messages = Messages::new(conn);
            if messages.sender_of(message).map_err(missing("message"))? != me {
                tracing::warn!(user_id = %me, message_id = %message, "delete by non-sender rejected");
                return Err(ServiceError::Forbidden("only the sender can delete a message"));
            }
            messages.delete(message).map_err(missing("message"))?;
            tracing::debug!(message_id = %message, chat_id = %chat, "message deleted");
            Ok(())
        })
    }

    /// Set (or replace) the requester's comment on a message.
    pub fn comment_message(
        &self,
        key: &str,
        message: MessageId,
        text: &str,
    ) -> Result<(), ServiceError> {
        validate_comment(text)?;
        self.write("comment_message", |conn| {
            let me = authenticate(conn, key)?;
            message_chat(conn, me, message)?;
            Statuses::new(conn)
                .set_comment(message, me, text)
                .map_err(missing("delivery status"))
        })
    }

    pub fn uncomment_message(&self, key: &str, message: MessageId) -> Result<(), ServiceError> {
        self.write("uncomment_message", |conn| {
            let me = authenticate(conn, key)?;
            message_chat(conn, me, message)?;
            Statuses::new(conn)
                .clear_comment(message, me)
                .map_err(missing("delivery status"))
        })
    }

    pub fn mark_received(&self, key: &str, message: MessageId) -> Result<(), ServiceError> {
        self.write("mark_received", |conn| {
            let me = authenticate(conn, key)?;
            message_chat(conn, me, message)?;
            Statuses::new(conn)
                .mark_sent(message, me)
                .map_err(missing("delivery status"))
        })
    }

    /// Idempotent; also marks the message received.
    pub fn mark_seen(&self, key: &str, message: MessageId) -> Result<(), ServiceError> {
        self.write("mark_seen", |conn| {
            let me = authenticate(conn, key)?;
            message_chat(conn, me, message)?;
            Statuses::new(conn)
                .mark_seen(message, me)
                .map_err(missing("delivery status"))
        })
    }
}

/// The chat a message belongs to, provided the user is one of its members.
fn message_chat(conn: &Connection, user: UserId, message: MessageId) -> Result<ChatId, ServiceError> {
    let chat = Messages::new(conn)
        .chat_of(message)
        .map_err(missing("message"))?;
    require_member(conn, user, chat)?;
    Ok(chat)
}

fn deliver(
    conn: &Connection,
    chat: ChatId,
    sender: UserId,
    body: &OutgoingMessage<'_>,
) -> Result<MessageId, ServiceError> {
    let id = Messages::new(conn).insert(&NewMessage {
        chat_id: chat,
        sender_id: sender,
        text: body.text,
        media: body.media,
        forwarded: body.forwarded,
        timestamp: Utc::now(),
    })?;

    let recipients = Chats::new(conn).members(chat)?;
    Statuses::new(conn).init(id, &recipients)?;

    tracing::debug!(
        message_id = %id,
        chat_id = %chat,
        sender = %sender,
        forwarded = body.forwarded,
        "message delivered"
    );
    Ok(id)
}

pub(super) fn message_view(conn: &Connection, message: Message) -> Result<MessageView, ServiceError> {
    let statuses = Statuses::new(conn);
    Ok(MessageView {
        comments: statuses.comments(message.id)?,
        seen_by: statuses.seen_by(message.id)?,
        message,
    })
}

fn send_failed(err: ServiceError) -> ServiceError {
    match err {
        ServiceError::Storage => ServiceError::SendFailed,
        other => other,
    }
}
