//! Conversation store: chats and their membership rows.

use chrono::Utc;
use rusqlite::{params, Connection};
use wasatext_shared::{ChatId, MessageId, UserId};

use crate::error::{constraint_violation, not_found, Constraint, Result, StoreError};
use crate::models::{format_timestamp, parse_timestamp, Chat, ChatSummary, MessagePreview};

/// Borrowed view over `chats` and `chat_members`.
pub struct Chats<'c> {
    conn: &'c Connection,
}

impl<'c> Chats<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ------------------------------------------------------------------
    // Chats
    // ------------------------------------------------------------------

    pub fn create(&self, name: &str, is_group: bool) -> Result<ChatId> {
        self.conn.execute(
            "INSERT INTO chats (name, is_group, created_at) VALUES (?1, ?2, ?3)",
            params![name, is_group, format_timestamp(&Utc::now())],
        )?;
        Ok(ChatId(self.conn.last_insert_rowid()))
    }

    pub fn get(&self, id: ChatId) -> Result<Chat> {
        self.conn
            .query_row(
                "SELECT id, name, is_group, avatar IS NOT NULL, created_at
                 FROM chats WHERE id = ?1",
                params![id.get()],
                |row| {
                    let created: String = row.get(4)?;
                    Ok(Chat {
                        id: ChatId(row.get(0)?),
                        name: row.get(1)?,
                        is_group: row.get(2)?,
                        has_avatar: row.get(3)?,
                        created_at: parse_timestamp(4, &created)?,
                    })
                },
            )
            .map_err(not_found)
    }

    pub fn is_group(&self, id: ChatId) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT is_group FROM chats WHERE id = ?1",
                params![id.get()],
                |row| row.get(0),
            )
            .map_err(not_found)
    }

    pub fn name(&self, id: ChatId) -> Result<String> {
        self.conn
            .query_row(
                "SELECT name FROM chats WHERE id = ?1",
                params![id.get()],
                |row| row.get(0),
            )
            .map_err(not_found)
    }

    pub fn rename(&self, id: ChatId, new_name: &str) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE chats SET name = ?1 WHERE id = ?2",
            params![new_name, id.get()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn set_avatar(&self, id: ChatId, image: &[u8]) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE chats SET avatar = ?1 WHERE id = ?2",
            params![image, id.get()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn avatar(&self, id: ChatId) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT avatar FROM chats WHERE id = ?1",
                params![id.get()],
                |row| row.get(0),
            )
            .map_err(not_found)
    }

    // ON DELETE CASCADE: members, messages and their statuses go with it
    pub fn delete(&self, id: ChatId) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM chats WHERE id = ?1", params![id.get()])?;
        Ok(affected > 0)
    }

    /// Conversations the user belongs to, most recently active first.
    pub fn list_for_user(&self, user: UserId) -> Result<Vec<ChatSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.is_group, c.avatar IS NOT NULL,
                    m.id, m.sender_id, m.text, m.media IS NOT NULL, m.timestamp
             FROM chat_members cm
             JOIN chats c ON c.id = cm.chat_id
             LEFT JOIN messages m
                    ON m.id = (SELECT MAX(id) FROM messages WHERE chat_id = c.id)
             WHERE cm.user_id = ?1
             ORDER BY COALESCE(m.timestamp, c.created_at) DESC, c.id DESC",
        )?;

        let rows = stmt.query_map(params![user.get()], |row| {
            let last_id: Option<i64> = row.get(4)?;
            let last_message = match last_id {
                Some(id) => {
                    let ts: String = row.get(8)?;
                    Some(MessagePreview {
                        id: MessageId(id),
                        sender_id: UserId(row.get(5)?),
                        text: row.get(6)?,
                        has_media: row.get(7)?,
                        timestamp: parse_timestamp(8, &ts)?,
                    })
                }
                None => None,
            };
            Ok(ChatSummary {
                id: ChatId(row.get(0)?),
                name: row.get(1)?,
                is_group: row.get(2)?,
                has_avatar: row.get(3)?,
                last_message,
            })
        })?;

        let mut chats = Vec::new();
        for row in rows {
            chats.push(row?);
        }
        Ok(chats)
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Add a member. An existing pair is [`StoreError::AlreadyMember`]; a
    /// missing chat or user is [`StoreError::NotFound`].
    pub fn add_member(&self, chat: ChatId, user: UserId) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO chat_members (chat_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
                params![chat.get(), user.get(), format_timestamp(&Utc::now())],
            )
            .map_err(|e| match constraint_violation(&e) {
                Some(Constraint::PrimaryKey) | Some(Constraint::Unique) => StoreError::AlreadyMember,
                Some(Constraint::ForeignKey) => StoreError::NotFound,
                None => StoreError::from(e),
            })?;
        Ok(())
    }

    /// Remove a member. Fails [`StoreError::NotFound`] if the pair is absent.
    pub fn remove_member(&self, chat: ChatId, user: UserId) -> Result<()> {
        let affected = self.conn.execute(
            "DELETE FROM chat_members WHERE chat_id = ?1 AND user_id = ?2",
            params![chat.get(), user.get()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn is_member(&self, user: UserId, chat: ChatId) -> Result<bool> {
        let member = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM chat_members WHERE chat_id = ?1 AND user_id = ?2)",
            params![chat.get(), user.get()],
            |row| row.get(0),
        )?;
        Ok(member)
    }

    /// Current members ordered by user id.
    pub fn members(&self, chat: ChatId) -> Result<Vec<UserId>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id FROM chat_members WHERE chat_id = ?1 ORDER BY user_id ASC",
        )?;
        let rows = stmt.query_map(params![chat.get()], |row| row.get(0).map(UserId))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    pub fn member_count(&self, chat: ChatId) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM chat_members WHERE chat_id = ?1",
            params![chat.get()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_db;
    use crate::users::Users;

    #[test]
    fn create_and_read_chat() {
        let (db, _dir) = test_db();
        let conn = db.conn().unwrap();
        let chats = Chats::new(&conn);

        let id = chats.create("Group chat", true).unwrap();
        let chat = chats.get(id).unwrap();
        assert_eq!(chat.name, "Group chat");
        assert!(chat.is_group);
        assert!(!chat.has_avatar);
        assert!(chats.is_group(id).unwrap());

        chats.rename(id, "Climbing").unwrap();
        assert_eq!(chats.name(id).unwrap(), "Climbing");
        assert!(matches!(chats.get(ChatId(999)), Err(StoreError::NotFound)));
        assert!(matches!(chats.rename(ChatId(999), "x"), Err(StoreError::NotFound)));
    }

    #[test]
    fn membership_errors_are_typed() {
        let (db, _dir) = test_db();
        let conn = db.conn().unwrap();
        let users = Users::new(&conn);
        let chats = Chats::new(&conn);

        let alice = users.create("alice", "k1").unwrap();
        let chat = chats.create("Group chat", true).unwrap();

        chats.add_member(chat, alice).unwrap();
        assert!(chats.is_member(alice, chat).unwrap());
        assert!(matches!(
            chats.add_member(chat, alice),
            Err(StoreError::AlreadyMember)
        ));
        assert!(matches!(
            chats.add_member(chat, UserId(777)),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            chats.add_member(ChatId(888), alice),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn members_and_removal() {
        let (db, _dir) = test_db();
        let conn = db.conn().unwrap();
        let users = Users::new(&conn);
        let chats = Chats::new(&conn);

        let a = users.create("alice", "k1").unwrap();
        let b = users.create("bob", "k2").unwrap();
        let chat = chats.create("Group chat", true).unwrap();
        chats.add_member(chat, b).unwrap();
        chats.add_member(chat, a).unwrap();

        assert_eq!(chats.members(chat).unwrap(), vec![a, b]);
        assert_eq!(chats.member_count(chat).unwrap(), 2);

        chats.remove_member(chat, a).unwrap();
        assert!(!chats.is_member(a, chat).unwrap());
        assert!(matches!(
            chats.remove_member(chat, a),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn delete_cascades_membership() {
        let (db, _dir) = test_db();
        let conn = db.conn().unwrap();
        let users = Users::new(&conn);
        let chats = Chats::new(&conn);

        let a = users.create("alice", "k1").unwrap();
        let chat = chats.create("Group chat", true).unwrap();
        chats.add_member(chat, a).unwrap();

        assert!(chats.delete(chat).unwrap());
        assert!(!chats.is_member(a, chat).unwrap());
        assert!(!chats.delete(chat).unwrap());
    }

    #[test]
    fn list_for_user_without_messages() {
        let (db, _dir) = test_db();
        let conn = db.conn().unwrap();
        let users = Users::new(&conn);
        let chats = Chats::new(&conn);

        let a = users.create("alice", "k1").unwrap();
        let first = chats.create("first", true).unwrap();
        let second = chats.create("second", true).unwrap();
        chats.create("not mine", true).unwrap();
        chats.add_member(first, a).unwrap();
        chats.add_member(second, a).unwrap();

        let list = chats.list_for_user(a).unwrap();
        let ids: Vec<ChatId> = list.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert!(list.iter().all(|c| c.last_message.is_none()));
    }
}
