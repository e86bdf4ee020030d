use thiserror::Error;

/// Malformed client input, rejected before any storage access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username must be alphanumeric and between {min} and {max} characters")]
    Username { min: usize, max: usize },

    #[error("Chat name must be non-empty and at most {max} characters")]
    ChatName { max: usize },

    #[error("Member list must contain between 1 and {max} ids, got {got}")]
    MemberCount { got: usize, max: usize },

    #[error("Message must carry text or media")]
    EmptyMessage,

    #[error("Message text exceeds {max} characters")]
    MessageTooLong { max: usize },

    #[error("Comment must be non-empty and at most {max} characters")]
    Comment { max: usize },

    #[error("Image payload is empty")]
    EmptyImage,
}
