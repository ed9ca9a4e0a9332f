use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use crate::agent::ReplyAgent;
use crate::db::{ConversationStore, MessageStore};
use crate::errors::AppError;
use crate::models::{
    AddMessageRequest, ChatRequest, ChatResponse, Conversation, ConversationDetail, Message,
    MessageRole,
};

const MAX_MESSAGE_LENGTH: usize = 8000;

/// Trims `content` and checks it is non-empty.
fn require_content(content: &str) -> Result<&str, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::MissingContent);
    }
    Ok(content)
}

/// [`require_content`] plus the length limit on chat input.
fn validate_content(content: &str) -> Result<&str, AppError> {
    let content = require_content(content)?;
    let length = content.chars().count();
    if length > MAX_MESSAGE_LENGTH {
        return Err(AppError::FieldTooLong {
            field_name: "content".to_string(),
            max_length: MAX_MESSAGE_LENGTH,
            actual_length: length,
        });
    }
    Ok(content)
}

/// Attaches each conversation's messages, preserving conversation order.
fn attach_messages(
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
) -> Vec<ConversationDetail> {
    let mut by_conversation: HashMap<i64, Vec<Message>> = HashMap::new();
    for message in messages {
        by_conversation.entry(message.conversation_id).or_default().push(message);
    }
    conversations
        .into_iter()
        .map(|c| {
            let messages = by_conversation.remove(&c.id).unwrap_or_default();
            ConversationDetail::new(c, messages)
        })
        .collect()
}

#[derive(Clone)]
pub struct ChatService {
    conversation_repo: Arc<dyn ConversationStore>,
    message_repo: Arc<dyn MessageStore>,
    agent: Arc<dyn ReplyAgent>,
}

impl ChatService {
    pub fn new(
        conversation_repo: Arc<dyn ConversationStore>,
        message_repo: Arc<dyn MessageStore>,
        agent: Arc<dyn ReplyAgent>,
    ) -> Self {
        Self { conversation_repo, message_repo, agent }
    }

    async fn require_conversation(&self, id: i64) -> Result<Conversation, AppError> {
        self.conversation_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::ConversationNotFound { id })
    }

    pub async fn list_conversations(&self) -> Result<Vec<ConversationDetail>, AppError> {
        let conversations = self.conversation_repo.find_all().await?;
        let ids: Vec<i64> = conversations.iter().map(|c| c.id).collect();
        let messages = self.message_repo.find_by_conversation_ids(&ids).await?;
        Ok(attach_messages(conversations, messages))
    }

    pub async fn create_conversation(&self) -> Result<ConversationDetail, AppError> {
        let conversation = self.conversation_repo.create().await?;
        info!("Created conversation {}", conversation.id);
        Ok(ConversationDetail::new(conversation, Vec::new()))
    }

    pub async fn get_conversation(&self, id: i64) -> Result<ConversationDetail, AppError> {
        let conversation = self.require_conversation(id).await?;
        let messages = self.message_repo.find_by_conversation_id(id).await?;
        Ok(ConversationDetail::new(conversation, messages))
    }

    pub async fn delete_conversation(&self, id: i64) -> Result<(), AppError> {
        if !self.conversation_repo.delete(id).await? {
            return Err(AppError::ConversationNotFound { id });
        }
        info!("Deleted conversation {id}");
        Ok(())
    }

    pub async fn list_messages(&self, conversation_id: Option<i64>) -> Result<Vec<Message>, AppError> {
        match conversation_id {
            Some(id) => self.message_repo.find_by_conversation_id(id).await,
            None => self.message_repo.find_all().await,
        }
    }

    pub async fn get_message(&self, id: i64) -> Result<Message, AppError> {
        self.message_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::MessageNotFound { id })
    }

    /// Stores a message with an explicit role, without asking the assistant.
    pub async fn add_message(
        &self,
        conversation_id: i64,
        request: AddMessageRequest,
    ) -> Result<Message, AppError> {
        self.require_conversation(conversation_id).await?;
        let content = require_content(&request.content)?;
        self.message_repo.create(conversation_id, request.role, content).await
    }

    pub async fn chat(
        &self,
        conversation_id: i64,
        request: ChatRequest,
    ) -> Result<ChatResponse, AppError> {
        self.require_conversation(conversation_id).await?;
        let content = validate_content(&request.content)?;

        // ── Persist user message ──────────────────────────────────────────────
        let user_message = self
            .message_repo
            .create(conversation_id, MessageRole::User, content)
            .await?;

        // ── Fetch history (excludes the just-saved user message) ──────────────
        let history: Vec<Message> = self
            .message_repo
            .find_by_conversation_id(conversation_id)
            .await?
            .into_iter()
            .filter(|m| m.id != user_message.id)
            .collect();

        // ── Ask the model; the user message stays stored if this fails ───────
        let reply = self.agent.reply(conversation_id, &history, content).await?;

        // ── Persist assistant reply & bump conversation timestamp ─────────────
        let assistant_message = self
            .message_repo
            .create(conversation_id, MessageRole::Assistant, &reply)
            .await?;
        if let Err(e) = self.conversation_repo.update_timestamp(conversation_id).await {
            error!("Failed to update conversation timestamp: {e}");
        }

        Ok(ChatResponse { conversation_id, user_message, assistant_message })
    }
}
