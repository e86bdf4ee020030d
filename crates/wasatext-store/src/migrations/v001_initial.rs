//! v001 -- Initial schema creation.
//!
//! Creates the five core tables: `users`, `chats`, `chat_members`,
//! `messages`, and `delivery_statuses`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    username     TEXT NOT NULL UNIQUE,
    security_key TEXT NOT NULL UNIQUE,
    avatar       BLOB,                       -- opaque image bytes
    created_at   TEXT NOT NULL               -- RFC-3339
);

-- ----------------------------------------------------------------
-- Chats
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chats (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL,
    is_group   INTEGER NOT NULL CHECK (is_group IN (0, 1)),
    avatar     BLOB,
    created_at TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Chat membership
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chat_members (
    chat_id   INTEGER NOT NULL,
    user_id   INTEGER NOT NULL,
    joined_at TEXT NOT NULL,

    PRIMARY KEY (chat_id, user_id),
    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_chat_members_user ON chat_members(user_id);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id   INTEGER NOT NULL,
    sender_id INTEGER NOT NULL,
    text      TEXT,
    media     BLOB,
    forwarded INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1
    timestamp TEXT NOT NULL,

    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE,
    FOREIGN KEY (sender_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id, id);

-- ----------------------------------------------------------------
-- Delivery statuses: one row per (message, recipient)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS delivery_statuses (
    message_id INTEGER NOT NULL,
    user_id    INTEGER NOT NULL,
    sent       INTEGER NOT NULL DEFAULT 0,
    seen       INTEGER NOT NULL DEFAULT 0,
    comment    TEXT NOT NULL DEFAULT '',  -- empty = no comment

    PRIMARY KEY (message_id, user_id),
    FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    CHECK (seen = 0 OR sent = 1)
);

CREATE INDEX IF NOT EXISTS idx_delivery_statuses_user ON delivery_statuses(user_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
