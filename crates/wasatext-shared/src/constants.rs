/// Largest member list accepted by chat creation and member addition
pub const MAX_CHAT_MEMBERS: usize = 2000;

/// Username length bounds (inclusive)
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 16;

/// Security keys are fixed-length alphanumeric tokens
pub const SECURITY_KEY_LEN: usize = 16;
pub const SECURITY_KEY_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Display name given to every newly created group
pub const GROUP_CHAT_DEFAULT_NAME: &str = "Group chat";

/// Maximum chat name length in characters
pub const MAX_CHAT_NAME_LEN: usize = 64;

/// Maximum message text length in characters
pub const MAX_MESSAGE_TEXT_LEN: usize = 4096;

/// Maximum comment (reaction) length in characters
pub const MAX_COMMENT_LEN: usize = 64;
