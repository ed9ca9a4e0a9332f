//! Persistence seams. The Postgres repositories implement these traits;
//! the service only sees the traits.

pub mod conversation_repository;
pub mod message_repository;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{Conversation, Message, MessageRole};

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Every conversation, most recently updated first.
    async fn find_all(&self) -> Result<Vec<Conversation>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Conversation>, AppError>;

    /// Inserts an empty conversation; ids and timestamps come from the store.
    async fn create(&self) -> Result<Conversation, AppError>;

    /// Returns `false` when no conversation had that id.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Sets `updated_at` to now.
    async fn update_timestamp(&self, id: i64) -> Result<(), AppError>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Messages of one conversation in chronological order.
    async fn find_by_conversation_id(&self, conversation_id: i64)
        -> Result<Vec<Message>, AppError>;

    /// Messages for several conversations at once, each group in chronological order.
    async fn find_by_conversation_ids(
        &self,
        conversation_ids: &[i64],
    ) -> Result<Vec<Message>, AppError>;

    async fn find_all(&self) -> Result<Vec<Message>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError>;

    async fn create(
        &self,
        conversation_id: i64,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, AppError>;
}
