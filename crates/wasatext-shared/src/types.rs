use serde::{Deserialize, Serialize};

// Surrogate keys assigned by the store (SQLite INTEGER PRIMARY KEY)
macro_rules! surrogate_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

surrogate_id!(
    /// Identifies a registered user.
    UserId
);
surrogate_id!(
    /// Identifies a private or group conversation.
    ChatId
);
surrogate_id!(
    /// Identifies a single message within a chat.
    MessageId
);
