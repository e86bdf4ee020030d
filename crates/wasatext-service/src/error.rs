use serde::Serialize;
use thiserror::Error;
use wasatext_shared::{UserId, ValidationError};
use wasatext_store::StoreError;

/// Failures surfaced by the conversation service.
///
/// `Display` output is safe to show to clients: storage internals are
/// logged, never formatted into the message.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid security key")]
    InvalidCredential,

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("User {0} not found")]
    MemberNotFound(UserId),

    #[error("Username already taken")]
    DuplicateUsername,

    #[error("User is already a member of this chat")]
    AlreadyMember,

    #[error("Chat is not a group")]
    NotAGroup,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Message could not be sent")]
    SendFailed,

    #[error("Request deadline exceeded")]
    Timeout,

    #[error("Internal storage error")]
    Storage,
}

/// Stable, transport-neutral classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidCredential,
    Forbidden,
    NotFound,
    MemberNotFound,
    DuplicateUsername,
    AlreadyMember,
    NotAGroup,
    Validation,
    SendFailed,
    Timeout,
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidCredential => "invalid_credential",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::MemberNotFound => "member_not_found",
            ErrorKind::DuplicateUsername => "duplicate_username",
            ErrorKind::AlreadyMember => "already_member",
            ErrorKind::NotAGroup => "not_a_group",
            ErrorKind::Validation => "validation_error",
            ErrorKind::SendFailed => "send_failed",
            ErrorKind::Timeout => "timeout",
            ErrorKind::StorageFailure => "storage_failure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidCredential => ErrorKind::InvalidCredential,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::MemberNotFound(_) => ErrorKind::MemberNotFound,
            ServiceError::DuplicateUsername => ErrorKind::DuplicateUsername,
            ServiceError::AlreadyMember => ErrorKind::AlreadyMember,
            ServiceError::NotAGroup => ErrorKind::NotAGroup,
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::SendFailed => ErrorKind::SendFailed,
            ServiceError::Timeout => ErrorKind::Timeout,
            ServiceError::Storage => ErrorKind::StorageFailure,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound("record"),
            StoreError::InvalidCredential => ServiceError::InvalidCredential,
            StoreError::DuplicateUsername => ServiceError::DuplicateUsername,
            StoreError::AlreadyMember => ServiceError::AlreadyMember,
            StoreError::Busy | StoreError::Pool(_) => {
                tracing::warn!(error = %err, "storage wait exceeded");
                ServiceError::Timeout
            }
            other => {
                tracing::error!(error = %other, "unclassified storage failure");
                ServiceError::Storage
            }
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        ServiceError::from(StoreError::from(err))
    }
}
