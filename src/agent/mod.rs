mod prompt;

use async_trait::async_trait;
use rig::client::Nothing;
use rig::completion::Chat;
use rig::message::Message as RigMessage;
use rig::prelude::CompletionClient;
use rig::providers::ollama;
use tracing::{debug, error};

use crate::errors::AppError;
use crate::models::{Message, MessageRole};

use prompt::DEFAULT_SYSTEM_PROMPT;

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u64 = 500;

/// Builds the preamble for a conversation.
///
/// A leading system message replaces the brand prompt. Every later system
/// message is appended in the order it was stored, so instructions added
/// mid-conversation still reach the model.
fn preamble_for(history: &[Message]) -> String {
    let (base, rest) = match history.split_first() {
        Some((first, rest)) if first.role == MessageRole::System => (first.content.as_str(), rest),
        _ => (DEFAULT_SYSTEM_PROMPT, history),
    };
    let mut preamble = base.to_string();
    for m in rest.iter().filter(|m| m.role == MessageRole::System) {
        preamble.push_str("\n\n");
        preamble.push_str(&m.content);
    }
    preamble
}

/// Builds a rig [`RigMessage`] history list from stored [`Message`] records.
fn to_rig_history(messages: &[Message]) -> Vec<RigMessage> {
    messages
        .iter()
        .filter_map(|m| match m.role {
            MessageRole::User => Some(RigMessage::user(&m.content)),
            MessageRole::Assistant => Some(RigMessage::assistant(&m.content)),
            MessageRole::System => None, // folded into the preamble
        })
        .collect()
}

/// Produces the assistant's next turn in a conversation.
#[async_trait]
pub trait ReplyAgent: Send + Sync {
    /// Asks the model for a reply to `user_message`, replaying `history`
    /// (everything stored before it) as context. Returns the reply text.
    async fn reply(
        &self,
        conversation_id: i64,
        history: &[Message],
        user_message: &str,
    ) -> Result<String, AppError>;
}

/// Service that uses the rig [`ollama::Client`] to produce one assistant reply.
/// A fresh agent is built per request so the history is replayed from the DB each time.
#[derive(Clone)]
pub struct OllamaAgentService {
    client: ollama::Client,
    base_url: String,
    model: String,
}

impl OllamaAgentService {
    pub fn new(base_url: &str, model: &str) -> Result<Self, AppError> {
        let client = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(base_url)
            .build()
            .map_err(|e| AppError::Unexpected(format!("Failed to build Ollama client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ReplyAgent for OllamaAgentService {
    async fn reply(
        &self,
        conversation_id: i64,
        history: &[Message],
        user_message: &str,
    ) -> Result<String, AppError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(&preamble_for(history))
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS)
            .build();

        let rig_history = to_rig_history(history);
        debug!(
            "Replaying {} messages for conversation {conversation_id}",
            rig_history.len()
        );

        agent.chat(user_message, rig_history).await.map_err(|e| {
            error!("Ollama inference failed for conversation {conversation_id}: {e}");
            let msg = e.to_string();
            if msg.contains("Connection refused") || msg.contains("connect") {
                AppError::OllamaUnavailable { host: self.base_url.clone() }
            } else if msg.contains("model") {
                AppError::ModelNotFound { model_name: self.model.clone() }
            } else {
                AppError::InferenceError { message: msg }
            }
        })
    }
}
