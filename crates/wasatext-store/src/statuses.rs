//! Delivery status tracker: one row per (message, recipient).
//!
//! Rows are created only by [`Statuses::init`], in the same transaction as
//! the message they describe. Every other operation targets an existing row
//! and fails [`StoreError::NotFound`] when the pair has none, which is the
//! case for users who joined the chat after the message was sent.

use rusqlite::{params, Connection};
use wasatext_shared::{MessageId, UserId};

use crate::error::{not_found, Result, StoreError};
use crate::models::{Comment, DeliveryStatus};

/// Borrowed view over the `delivery_statuses` table.
pub struct Statuses<'c> {
    conn: &'c Connection,
}

impl<'c> Statuses<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert a pending row (`sent = false, seen = false, comment = ""`) for
    /// every recipient.
    pub fn init(&self, message: MessageId, recipients: &[UserId]) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO delivery_statuses (message_id, user_id) VALUES (?1, ?2)",
        )?;
        for recipient in recipients {
            stmt.execute(params![message.get(), recipient.get()])?;
        }
        tracing::debug!(
            message_id = %message,
            recipients = recipients.len(),
            "initialised delivery statuses"
        );
        Ok(())
    }

    /// Record that the recipient received the message. Idempotent; a row
    /// that is already seen stays seen.
    pub fn mark_sent(&self, message: MessageId, user: UserId) -> Result<()> {
        self.update(
            "UPDATE delivery_statuses SET sent = 1 WHERE message_id = ?1 AND user_id = ?2",
            params![message.get(), user.get()],
        )
    }

    /// Record that the recipient saw the message. Idempotent.
    ///
    /// Seeing implies receiving, so both flags are raised in one statement.
    pub fn mark_seen(&self, message: MessageId, user: UserId) -> Result<()> {
        self.update(
            "UPDATE delivery_statuses SET sent = 1, seen = 1
             WHERE message_id = ?1 AND user_id = ?2",
            params![message.get(), user.get()],
        )
    }

    /// Overwrite the user's comment on the message.
    pub fn set_comment(&self, message: MessageId, user: UserId, text: &str) -> Result<()> {
        self.update(
            "UPDATE delivery_statuses SET comment = ?3 WHERE message_id = ?1 AND user_id = ?2",
            params![message.get(), user.get(), text],
        )
    }

    pub fn clear_comment(&self, message: MessageId, user: UserId) -> Result<()> {
        self.update(
            "UPDATE delivery_statuses SET comment = '' WHERE message_id = ?1 AND user_id = ?2",
            params![message.get(), user.get()],
        )
    }

    /// Non-empty comments on the message, ordered by user id.
    pub fn comments(&self, message: MessageId) -> Result<Vec<Comment>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT user_id, comment FROM delivery_statuses
             WHERE message_id = ?1 AND comment <> ''
             ORDER BY user_id ASC",
        )?;
        let rows = stmt.query_map(params![message.get()], |row| {
            Ok(Comment {
                user_id: UserId(row.get(0)?),
                text: row.get(1)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    /// Users who have seen the message, ordered by user id.
    pub fn seen_by(&self, message: MessageId) -> Result<Vec<UserId>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT user_id FROM delivery_statuses
             WHERE message_id = ?1 AND seen = 1
             ORDER BY user_id ASC",
        )?;
        let rows = stmt.query_map(params![message.get()], |row| row.get(0).map(UserId))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    pub fn get(&self, message: MessageId, user: UserId) -> Result<DeliveryStatus> {
        self.conn
            .query_row(
                "SELECT message_id, user_id, sent, seen, comment FROM delivery_statuses
                 WHERE message_id = ?1 AND user_id = ?2",
                params![message.get(), user.get()],
                row_to_status,
            )
            .map_err(not_found)
    }

    /// Every status row of the message, ordered by user id.
    pub fn list_for_message(&self, message: MessageId) -> Result<Vec<DeliveryStatus>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT message_id, user_id, sent, seen, comment FROM delivery_statuses
             WHERE message_id = ?1
             ORDER BY user_id ASC",
        )?;
        let rows = stmt.query_map(params![message.get()], row_to_status)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    fn update(&self, sql: &str, params: impl rusqlite::Params) -> Result<()> {
        let affected = self.conn.execute(sql, params)?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn row_to_status(row: &rusqlite::Row<'_>) -> rusqlite::Result<DeliveryStatus> {
    Ok(DeliveryStatus {
        message_id: MessageId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        sent: row.get(2)?,
        seen: row.get(3)?,
        comment: row.get(4)?,
    })
}
