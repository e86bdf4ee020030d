//! Async facade over [`ConversationService`].
//!
//! SQLite calls block, so each request runs on tokio's blocking pool: one
//! request, one worker, independent transactions against the shared pool.
//!
//! Named methods cover the calls a polling client makes most (login, chat
//! listing, send, mark seen). Every other operation goes through
//! [`AsyncConversationService::run`] with a closure over the blocking API:
//!
//! ```ignore
//! handle.run(move |svc| svc.comment_message(&key, message, "👍")).await?;
//! ```

use std::sync::Arc;

use wasatext_shared::{ChatId, MessageId, UserId};
use wasatext_store::ChatSummary;

use crate::error::ServiceError;
use crate::service::ConversationService;
use crate::views::{Conversation, LoginOutcome, OutgoingMessage};

/// Cheaply cloneable async handle. All clones share one service.
#[derive(Clone)]
pub struct AsyncConversationService {
    inner: Arc<ConversationService>,
}

impl AsyncConversationService {
    pub fn new(service: ConversationService) -> Self {
        Self {
            inner: Arc::new(service),
        }
    }

    pub fn inner(&self) -> &ConversationService {
        &self.inner
    }

    /// Run any blocking service call on the blocking pool. This is the
    /// general entry point; the named methods below are shorthands for it.
    pub async fn run<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&ConversationService) -> Result<T, ServiceError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "service worker did not complete");
                ServiceError::Storage
            })?
    }

    pub async fn login(&self, username: impl Into<String>) -> Result<LoginOutcome, ServiceError> {
        let username = username.into();
        self.run(move |svc| svc.login(&username)).await
    }

    pub async fn new_chat(
        &self,
        key: impl Into<String>,
        members: Vec<UserId>,
    ) -> Result<ChatId, ServiceError> {
        let key = key.into();
        self.run(move |svc| svc.new_chat(&key, &members)).await
    }

    pub async fn send_message(
        &self,
        key: impl Into<String>,
        chat: ChatId,
        text: Option<String>,
        media: Option<Vec<u8>>,
    ) -> Result<MessageId, ServiceError> {
        let key = key.into();
        self.run(move |svc| {
            let body = OutgoingMessage {
                text: text.as_deref(),
                media: media.as_deref(),
                forwarded: false,
            };
            svc.send_message(&key, chat, &body)
        })
        .await
    }

    pub async fn mark_seen(
        &self,
        key: impl Into<String>,
        message: MessageId,
    ) -> Result<(), ServiceError> {
        let key = key.into();
        self.run(move |svc| svc.mark_seen(&key, message)).await
    }

    pub async fn my_conversations(
        &self,
        key: impl Into<String>,
    ) -> Result<Vec<ChatSummary>, ServiceError> {
        let key = key.into();
        self.run(move |svc| svc.my_conversations(&key)).await
    }

    pub async fn conversation(
        &self,
        key: impl Into<String>,
        chat: ChatId,
    ) -> Result<Conversation, ServiceError> {
        let key = key.into();
        self.run(move |svc| svc.conversation(&key, chat)).await
    }
}
