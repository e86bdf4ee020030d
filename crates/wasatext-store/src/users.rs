//! Identity store: users keyed by unique username and unique security key.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use wasatext_shared::UserId;

use crate::error::{constraint_message, constraint_violation, not_found, Constraint, Result, StoreError};
use crate::models::{format_timestamp, parse_timestamp, User};

/// Borrowed view over the `users` table.
pub struct Users<'c> {
    conn: &'c Connection,
}

impl<'c> Users<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn exists(&self, username: &str) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            params![username],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Insert a new user. A taken username surfaces as
    /// [`StoreError::DuplicateUsername`].
    pub fn create(&self, username: &str, security_key: &str) -> Result<UserId> {
        self.conn
            .execute(
                "INSERT INTO users (username, security_key, created_at) VALUES (?1, ?2, ?3)",
                params![username, security_key, format_timestamp(&Utc::now())],
            )
            .map_err(map_username_conflict)?;
        let id = UserId(self.conn.last_insert_rowid());
        tracing::info!(user_id = %id, username, "created user");
        Ok(id)
    }

    pub fn resolve_by_key(&self, security_key: &str) -> Result<UserId> {
        self.conn
            .query_row(
                "SELECT id FROM users WHERE security_key = ?1",
                params![security_key],
                |row| row.get(0).map(UserId),
            )
            .optional()?
            .ok_or(StoreError::InvalidCredential)
    }

    pub fn resolve_by_name(&self, username: &str) -> Result<UserId> {
        self.conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0).map(UserId),
            )
            .map_err(not_found)
    }

    pub fn username(&self, id: UserId) -> Result<String> {
        self.conn
            .query_row(
                "SELECT username FROM users WHERE id = ?1",
                params![id.get()],
                |row| row.get(0),
            )
            .map_err(not_found)
    }

    pub fn security_key(&self, id: UserId) -> Result<String> {
        self.conn
            .query_row(
                "SELECT security_key FROM users WHERE id = ?1",
                params![id.get()],
                |row| row.get(0),
            )
            .map_err(not_found)
    }

    pub fn get(&self, id: UserId) -> Result<User> {
        self.conn
            .query_row(
                "SELECT id, username, avatar IS NOT NULL, created_at FROM users WHERE id = ?1",
                params![id.get()],
                |row| {
                    let created: String = row.get(3)?;
                    Ok(User {
                        id: UserId(row.get(0)?),
                        username: row.get(1)?,
                        has_avatar: row.get(2)?,
                        created_at: parse_timestamp(3, &created)?,
                    })
                },
            )
            .map_err(not_found)
    }

    /// Change a username. Renaming to the user's own current name succeeds.
    pub fn rename(&self, id: UserId, new_name: &str) -> Result<()> {
        let affected = self
            .conn
            .execute(
                "UPDATE users SET username = ?1 WHERE id = ?2",
                params![new_name, id.get()],
            )
            .map_err(map_username_conflict)?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn set_avatar(&self, id: UserId, image: &[u8]) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE users SET avatar = ?1 WHERE id = ?2",
            params![image, id.get()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn avatar(&self, id: UserId) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT avatar FROM users WHERE id = ?1",
                params![id.get()],
                |row| row.get(0),
            )
            .map_err(not_found)
    }
}

fn map_username_conflict(err: rusqlite::Error) -> StoreError {
    let on_username = constraint_violation(&err) == Some(Constraint::Unique)
        && constraint_message(&err).is_some_and(|m| m.contains("users.username"));
    if on_username {
        StoreError::DuplicateUsername
    } else {
        StoreError::from(err)
    }
}
