use rusqlite::ffi;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error not otherwise classified.
    #[error("Database error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    /// No pooled connection became available in time.
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The database could not be opened at all.
    #[error("Could not open database: {0}")]
    Open(#[source] r2d2::Error),

    /// The database stayed locked by another writer past the busy timeout.
    #[error("Database is busy")]
    Busy,

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The referenced row (or a row it points at) does not exist.
    #[error("Record not found")]
    NotFound,

    /// No user holds the presented security key.
    #[error("Invalid security key")]
    InvalidCredential,

    /// The username is already taken by another user.
    #[error("Username already taken")]
    DuplicateUsername,

    /// The (chat, user) membership pair already exists.
    #[error("User is already a member of this chat")]
    AlreadyMember,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => StoreError::Busy,
            _ => StoreError::Sqlite(err),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Constraint families the stores translate into typed errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    PrimaryKey,
    ForeignKey,
}

/// Classify a constraint violation by its SQLite extended result code.
pub(crate) fn constraint_violation(err: &rusqlite::Error) -> Option<Constraint> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            match e.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE => Some(Constraint::Unique),
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Some(Constraint::PrimaryKey),
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Constraint::ForeignKey),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Message attached to a constraint failure, e.g. `UNIQUE constraint failed: users.username`.
pub(crate) fn constraint_message(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(_, msg) => msg.as_deref(),
        _ => None,
    }
}

/// Map a missing row to [`StoreError::NotFound`].
pub(crate) fn not_found(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::from(other),
    }
}
