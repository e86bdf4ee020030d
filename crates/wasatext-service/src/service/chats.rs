use rusqlite::Connection;
use wasatext_shared::constants::{GROUP_CHAT_DEFAULT_NAME, MAX_CHAT_MEMBERS};
use wasatext_shared::validation::{
    private_chat_name, validate_chat_name, validate_image, validate_member_count,
};
use wasatext_shared::{ChatId, UserId, ValidationError};
use wasatext_store::{ChatSummary, Chats, Messages, Users};

use super::messages::message_view;
use super::{
    authenticate, dedup_members, missing, missing_member, require_group, require_member,
    ConversationService,
};
use crate::error::ServiceError;
use crate::views::Conversation;

impl ConversationService {
    /// Create a chat with the given members, the requester among them.
    ///
    /// Exactly two distinct members make a private chat named after both;
    /// anything else is a group. The chat and all of its memberships are
    /// written in one transaction: an unknown member id leaves nothing behind.
    pub fn new_chat(&self, key: &str, member_ids: &[UserId]) -> Result<ChatId, ServiceError> {
        validate_member_count(member_ids.len())?;
        let members = dedup_members(member_ids);

        self.write("new_chat", |conn| {
            let me = authenticate(conn, key)?;
            if !members.contains(&me) {
                tracing::warn!(user_id = %me, "chat creation without the requester rejected");
                return Err(ServiceError::Forbidden("requester must be a member of the new chat"));
            }

            let (name, is_group) = match members.as_slice() {
                [first, second] => {
                    let users = Users::new(conn);
                    let first_name = users.username(*first).map_err(missing_member(*first))?;
                    let second_name = users.username(*second).map_err(missing_member(*second))?;
                    (private_chat_name(&first_name, &second_name), false)
                }
                _ => (GROUP_CHAT_DEFAULT_NAME.to_string(), true),
            };

            let chats = Chats::new(conn);
            let chat = chats.create(&name, is_group)?;
            for member in &members {
                chats.add_member(chat, *member).map_err(missing_member(*member))?;
            }

            tracing::info!(
                chat_id = %chat,
                creator = %me,
                is_group,
                members = members.len(),
                "chat created"
            );
            Ok(chat)
        })
    }

    /// Add users to a group. All-or-nothing: an unknown id or an existing
    /// member aborts the whole batch.
    pub fn add_members(
        &self,
        key: &str,
        chat: ChatId,
        member_ids: &[UserId],
    ) -> Result<(), ServiceError> {
        validate_member_count(member_ids.len())?;
        let members = dedup_members(member_ids);

        self.write("add_members", |conn| {
            let me = authenticate(conn, key)?;
            require_member(conn, me, chat)?;
            require_group(conn, chat)?;

            let chats = Chats::new(conn);
            for member in &members {
                chats.add_member(chat, *member).map_err(missing_member(*member))?;
            }

            let total = chats.member_count(chat)?;
            if total > MAX_CHAT_MEMBERS {
                return Err(ValidationError::MemberCount {
                    got: total,
                    max: MAX_CHAT_MEMBERS,
                }
                .into());
            }

            tracing::info!(chat_id = %chat, added = members.len(), by = %me, "members added");
            Ok(())
        })
    }

    /// Leave a group. The last member out deletes it.
    pub fn leave_group(&self, key: &str, chat: ChatId) -> Result<(), ServiceError> {
        self.write("leave_group", |conn| {
            let me = authenticate(conn, key)?;
            require_member(conn, me, chat)?;
            require_group(conn, chat)?;
            depart(conn, chat, me)
        })
    }

    /// Remove another member from a group the requester belongs to.
    pub fn remove_member(&self, key: &str, chat: ChatId, user: UserId) -> Result<(), ServiceError> {
        self.write("remove_member", |conn| {
            let me = authenticate(conn, key)?;
            require_member(conn, me, chat)?;
            require_group(conn, chat)?;
            depart(conn, chat, user)
        })
    }

    pub fn rename_chat(&self, key: &str, chat: ChatId, name: &str) -> Result<(), ServiceError> {
        validate_chat_name(name)?;
        self.write("rename_chat", |conn| {
            let me = authenticate(conn, key)?;
            require_member(conn, me, chat)?;
            require_group(conn, chat)?;
            Chats::new(conn).rename(chat, name).map_err(missing("chat"))?;
            tracing::info!(chat_id = %chat, by = %me, "chat renamed");
            Ok(())
        })
    }

    pub fn chat_name(&self, key: &str, chat: ChatId) -> Result<String, ServiceError> {
        self.read("chat_name", |conn| {
            let me = authenticate(conn, key)?;
            require_member(conn, me, chat)?;
            Chats::new(conn).name(chat).map_err(missing("chat"))
        })
    }

    pub fn set_chat_photo(&self, key: &str, chat: ChatId, image: &[u8]) -> Result<(), ServiceError> {
        validate_image(image)?;
        self.write("set_chat_photo", |conn| {
            let me = authenticate(conn, key)?;
            require_member(conn, me, chat)?;
            require_group(conn, chat)?;
            Chats::new(conn).set_avatar(chat, image).map_err(missing("chat"))
        })
    }

    pub fn chat_photo(&self, key: &str, chat: ChatId) -> Result<Option<Vec<u8>>, ServiceError> {
        self.read("chat_photo", |conn| {
            let me = authenticate(conn, key)?;
            require_member(conn, me, chat)?;
            Chats::new(conn).avatar(chat).map_err(missing("chat"))
        })
    }

    /// The requester's chats, most recently active first.
    pub fn my_conversations(&self, key: &str) -> Result<Vec<ChatSummary>, ServiceError> {
        self.read("my_conversations", |conn| {
            let me = authenticate(conn, key)?;
            Ok(Chats::new(conn).list_for_user(me)?)
        })
    }

    /// A chat with its members and full message history.
    pub fn conversation(&self, key: &str, chat: ChatId) -> Result<Conversation, ServiceError> {
        self.read("conversation", |conn| {
            let me = authenticate(conn, key)?;
            require_member(conn, me, chat)?;

            let chats = Chats::new(conn);
            let info = chats.get(chat).map_err(missing("chat"))?;
            let members = chats.members(chat)?;
            let messages = Messages::new(conn)
                .list_in_chat(chat)?
                .into_iter()
                .map(|message| message_view(conn, message))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Conversation {
                chat: info,
                members,
                messages,
            })
        })
    }
}

fn depart(conn: &Connection, chat: ChatId, user: UserId) -> Result<(), ServiceError> {
    let chats = Chats::new(conn);
    chats.remove_member(chat, user).map_err(missing("member"))?;

    if chats.member_count(chat)? == 0 {
        chats.delete(chat)?;
        tracing::info!(chat_id = %chat, "last member left, group deleted");
    } else {
        tracing::info!(chat_id = %chat, user_id = %user, "member left group");
    }
    Ok(())
}
