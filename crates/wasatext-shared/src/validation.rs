//! Input checks applied by the service before touching the store.

use crate::constants::{
    MAX_CHAT_MEMBERS, MAX_CHAT_NAME_LEN, MAX_COMMENT_LEN, MAX_MESSAGE_TEXT_LEN,
    USERNAME_MAX_LEN, USERNAME_MIN_LEN,
};
use crate::error::ValidationError;

/// Usernames are 3 to 16 ASCII alphanumeric characters.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len_ok = (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username.len());
    if len_ok && username.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ValidationError::Username {
            min: USERNAME_MIN_LEN,
            max: USERNAME_MAX_LEN,
        })
    }
}

pub fn validate_chat_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() || name.chars().count() > MAX_CHAT_NAME_LEN {
        return Err(ValidationError::ChatName {
            max: MAX_CHAT_NAME_LEN,
        });
    }
    Ok(())
}

pub fn validate_member_count(count: usize) -> Result<(), ValidationError> {
    if count == 0 || count > MAX_CHAT_MEMBERS {
        return Err(ValidationError::MemberCount {
            got: count,
            max: MAX_CHAT_MEMBERS,
        });
    }
    Ok(())
}

/// A message needs text, media, or both. Blank text counts as absent.
pub fn validate_message_body(
    text: Option<&str>,
    media: Option<&[u8]>,
) -> Result<(), ValidationError> {
    let has_text = text.is_some_and(|t| !t.trim().is_empty());
    let has_media = media.is_some_and(|m| !m.is_empty());
    if !has_text && !has_media {
        return Err(ValidationError::EmptyMessage);
    }
    if text.is_some_and(|t| t.chars().count() > MAX_MESSAGE_TEXT_LEN) {
        return Err(ValidationError::MessageTooLong {
            max: MAX_MESSAGE_TEXT_LEN,
        });
    }
    Ok(())
}

pub fn validate_comment(comment: &str) -> Result<(), ValidationError> {
    if comment.trim().is_empty() || comment.chars().count() > MAX_COMMENT_LEN {
        return Err(ValidationError::Comment {
            max: MAX_COMMENT_LEN,
        });
    }
    Ok(())
}

pub fn validate_image(bytes: &[u8]) -> Result<(), ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::EmptyImage);
    }
    Ok(())
}

/// Display name of a two-party chat.
pub fn private_chat_name(first: &str, second: &str) -> String {
    format!("Chat between {first} and {second}")
}
