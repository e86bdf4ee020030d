use rusqlite::{params, Connection, OptionalExtension};
use wasatext_shared::{ChatId, MessageId, UserId};

use crate::error::{not_found, Result, StoreError};
use crate::models::{format_timestamp, parse_timestamp, Message, NewMessage};

const MESSAGE_COLUMNS: &str =
    "id, chat_id, sender_id, text, media IS NOT NULL, forwarded, timestamp";

/// Borrowed view over the `messages` table.
pub struct Messages<'c> {
    conn: &'c Connection,
}

impl<'c> Messages<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, message: &NewMessage<'_>) -> Result<MessageId> {
        self.conn.execute(
            "INSERT INTO messages (chat_id, sender_id, text, media, forwarded, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.chat_id.get(),
                message.sender_id.get(),
                message.text,
                message.media,
                message.forwarded,
                format_timestamp(&message.timestamp),
            ],
        )?;
        Ok(MessageId(self.conn.last_insert_rowid()))
    }

    // ON DELETE CASCADE: the delivery statuses go with it
    pub fn delete(&self, id: MessageId) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM messages WHERE id = ?1", params![id.get()])?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn get(&self, id: MessageId) -> Result<Message> {
        self.conn
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id.get()],
                row_to_message,
            )
            .map_err(not_found)
    }

    /// Message ids of a chat in chronological (insertion) order.
    pub fn list_by_chat(&self, chat: ChatId) -> Result<Vec<MessageId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM messages WHERE chat_id = ?1 ORDER BY id ASC")?;
        let rows = stmt.query_map(params![chat.get()], |row| row.get(0).map(MessageId))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    /// Full messages of a chat in chronological (insertion) order.
    pub fn list_in_chat(&self, chat: ChatId) -> Result<Vec<Message>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ?1 ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![chat.get()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Most recent message of a chat, `None` while the chat is empty.
    pub fn latest_in_chat(&self, chat: ChatId) -> Result<Option<Message>> {
        let latest = self
            .conn
            .query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ?1
                     ORDER BY id DESC LIMIT 1"
                ),
                params![chat.get()],
                row_to_message,
            )
            .optional()?;
        Ok(latest)
    }

    /// Raw media bytes, `None` for text-only messages.
    pub fn media(&self, id: MessageId) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT media FROM messages WHERE id = ?1",
                params![id.get()],
                |row| row.get(0),
            )
            .map_err(not_found)
    }

    pub fn chat_of(&self, id: MessageId) -> Result<ChatId> {
        self.conn
            .query_row(
                "SELECT chat_id FROM messages WHERE id = ?1",
                params![id.get()],
                |row| row.get(0).map(ChatId),
            )
            .map_err(not_found)
    }

    pub fn sender_of(&self, id: MessageId) -> Result<UserId> {
        self.conn
            .query_row(
                "SELECT sender_id FROM messages WHERE id = ?1",
                params![id.get()],
                |row| row.get(0).map(UserId),
            )
            .map_err(not_found)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let ts: String = row.get(6)?;
    Ok(Message {
        id: MessageId(row.get(0)?),
        chat_id: ChatId(row.get(1)?),
        sender_id: UserId(row.get(2)?),
        text: row.get(3)?,
        has_media: row.get(4)?,
        forwarded: row.get(5)?,
        timestamp: parse_timestamp(6, &ts)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::chats::Chats;
    use crate::database::test_db;
    use crate::users::Users;

    fn text_message(chat: ChatId, sender: UserId, text: &str) -> NewMessage<'_> {
        NewMessage {
            chat_id: chat,
            sender_id: sender,
            text: Some(text),
            media: None,
            forwarded: false,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn insert_get_delete() {
        let (db, _dir) = test_db();
        let conn = db.conn().unwrap();
        let alice = Users::new(&conn).create("alice", "k1").unwrap();
        let chat = Chats::new(&conn).create("Group chat", true).unwrap();
        let messages = Messages::new(&conn);

        let id = messages.insert(&text_message(chat, alice, "hello")).unwrap();
        let stored = messages.get(id).unwrap();
        assert_eq!(stored.chat_id, chat);
        assert_eq!(stored.sender_id, alice);
        assert_eq!(stored.text.as_deref(), Some("hello"));
        assert!(!stored.has_media);
        assert!(!stored.forwarded);
        assert_eq!(messages.chat_of(id).unwrap(), chat);
        assert_eq!(messages.sender_of(id).unwrap(), alice);

        messages.delete(id).unwrap();
        assert!(matches!(messages.get(id), Err(StoreError::NotFound)));
        assert!(matches!(messages.delete(id), Err(StoreError::NotFound)));
    }

    #[test]
    fn media_is_loaded_separately() {
        let (db, _dir) = test_db();
        let conn = db.conn().unwrap();
        let alice = Users::new(&conn).create("alice", "k1").unwrap();
        let chat = Chats::new(&conn).create("Group chat", true).unwrap();
        let messages = Messages::new(&conn);

        let gif = b"GIF89a\x01\x00";
        let id = messages
            .insert(&NewMessage {
                chat_id: chat,
                sender_id: alice,
                text: None,
                media: Some(&gif[..]),
                forwarded: true,
                timestamp: Utc::now(),
            })
            .unwrap();

        let stored = messages.get(id).unwrap();
        assert!(stored.has_media);
        assert!(stored.forwarded);
        assert_eq!(stored.text, None);
        assert_eq!(messages.media(id).unwrap().as_deref(), Some(&gif[..]));
    }

    #[test]
    fn listing_follows_insertion_order() {
        let (db, _dir) = test_db();
        let conn = db.conn().unwrap();
        let alice = Users::new(&conn).create("alice", "k1").unwrap();
        let chats = Chats::new(&conn);
        let chat = chats.create("Group chat", true).unwrap();
        let elsewhere = chats.create("Group chat", true).unwrap();
        let messages = Messages::new(&conn);

        // A skewed client clock must not reorder history.
        let mut late = text_message(chat, alice, "first");
        late.timestamp = Utc::now() + Duration::hours(1);
        let first = messages.insert(&late).unwrap();
        let second = messages.insert(&text_message(chat, alice, "second")).unwrap();
        messages.insert(&text_message(elsewhere, alice, "other")).unwrap();

        assert_eq!(messages.list_by_chat(chat).unwrap(), vec![first, second]);
        let texts: Vec<_> = messages
            .list_in_chat(chat)
            .unwrap()
            .into_iter()
            .map(|m| m.text.unwrap_or_default())
            .collect();
        assert_eq!(texts, vec!["first", "second"]);

        // id order wins over the skewed timestamp
        let latest = messages.latest_in_chat(chat).unwrap().unwrap();
        assert_eq!(latest.id, second);
        let empty = chats.create("Group chat", true).unwrap();
        assert_eq!(messages.latest_in_chat(empty).unwrap(), None);

        messages.delete(second).unwrap();
        assert_eq!(messages.latest_in_chat(chat).unwrap().map(|m| m.id), Some(first));
    }
}
