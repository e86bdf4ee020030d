//! The conversation service.
//!
//! Operations are split by concern across `identity`, `chats` and
//! `messages`, all as inherent methods on [`ConversationService`]. Every
//! operation runs inside one transaction opened here: writes take the
//! database write lock up front (`BEGIN IMMEDIATE`), so authorization checks
//! and the mutations they guard see the same state. Dropping a transaction
//! without committing rolls it back, which covers every early `?` return.

mod chats;
mod identity;
mod messages;

use std::time::{Duration, Instant};

use rusqlite::{Connection, TransactionBehavior};
use wasatext_shared::{ChatId, UserId};
use wasatext_store::{Chats, Database, StoreError, Users};

use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// Orchestrator over the identity, conversation, message and delivery
/// stores. Construct once per process and share (it is `Send + Sync`).
pub struct ConversationService {
    db: Database,
    request_timeout: Duration,
}

impl ConversationService {
    pub fn new(db: Database, config: &ServiceConfig) -> Self {
        Self {
            db,
            request_timeout: config.request_timeout,
        }
    }

    /// Open the configured database and build a service over it.
    pub fn open(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let options = config.database_options();
        let db = match &config.database_path {
            Some(path) => Database::open_at(path, &options)?,
            None => Database::open_default(&options)?,
        };
        Ok(Self::new(db, config))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Liveness probe against the store.
    pub fn ping(&self) -> Result<(), ServiceError> {
        self.db.ping()?;
        Ok(())
    }

    /// Run `f` in a write transaction.
    fn write<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Connection) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        self.in_transaction(op, TransactionBehavior::Immediate, f)
    }

    /// Run `f` in a read transaction (one consistent snapshot).
    fn read<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Connection) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        self.in_transaction(op, TransactionBehavior::Deferred, f)
    }

    fn in_transaction<T>(
        &self,
        op: &'static str,
        behavior: TransactionBehavior,
        f: impl FnOnce(&Connection) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let started = Instant::now();
        let mut conn = self.db.conn()?;
        let tx = conn.transaction_with_behavior(behavior)?;

        let scoped: &Connection = &tx;
        let value = f(scoped)?;

        let elapsed = started.elapsed();
        if elapsed > self.request_timeout {
            tracing::warn!(
                op,
                elapsed_ms = elapsed.as_millis() as u64,
                "request deadline exceeded, rolling back"
            );
            return Err(ServiceError::Timeout);
        }

        tx.commit()?;
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Guards shared by the operation modules
// ---------------------------------------------------------------------------

/// Resolve a presented security key to its user.
fn authenticate(conn: &Connection, key: &str) -> Result<UserId, ServiceError> {
    match Users::new(conn).resolve_by_key(key) {
        Ok(id) => Ok(id),
        Err(StoreError::InvalidCredential) => {
            tracing::warn!("rejected unknown security key");
            Err(ServiceError::InvalidCredential)
        }
        Err(other) => Err(other.into()),
    }
}

/// Membership gate in front of every chat-scoped operation. A chat that does
/// not exist is indistinguishable from one the user is not in.
fn require_member(conn: &Connection, user: UserId, chat: ChatId) -> Result<(), ServiceError> {
    if Chats::new(conn).is_member(user, chat)? {
        return Ok(());
    }
    tracing::warn!(user_id = %user, chat_id = %chat, "non-member access rejected");
    Err(ServiceError::Forbidden("not a member of this chat"))
}

fn require_group(conn: &Connection, chat: ChatId) -> Result<(), ServiceError> {
    if Chats::new(conn).is_group(chat).map_err(missing("chat"))? {
        Ok(())
    } else {
        Err(ServiceError::NotAGroup)
    }
}

/// Name the entity behind a [`StoreError::NotFound`].
fn missing(entity: &'static str) -> impl Fn(StoreError) -> ServiceError {
    move |err| match err {
        StoreError::NotFound => ServiceError::NotFound(entity),
        other => other.into(),
    }
}

/// A user id in a member list that does not resolve.
fn missing_member(user: UserId) -> impl Fn(StoreError) -> ServiceError {
    move |err| match err {
        StoreError::NotFound => ServiceError::MemberNotFound(user),
        other => other.into(),
    }
}

/// Drop repeated ids, keeping first-occurrence order.
fn dedup_members(ids: &[UserId]) -> Vec<UserId> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
