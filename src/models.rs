use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MessageRole {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            "system" => Ok(MessageRole::System),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// A stored message. `conversation_id` is kept off the wire; messages are
/// always served nested under (or filtered by) their conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: i64,
    #[serde(skip_serializing)]
    pub conversation_id: i64,
    pub content: String,
    pub role: MessageRole,
    pub created_at: DateTime<Utc>,
}

/// A conversation together with its messages in chronological order.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationDetail {
    pub id: i64,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationDetail {
    pub fn new(conversation: Conversation, messages: Vec<Message>) -> Self {
        Self {
            id: conversation.id,
            messages,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

/// Page envelope for list endpoints. Everything is served as a single page.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn single(results: Vec<T>) -> Self {
        Self { count: results.len(), next: None, previous: None, results }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    #[serde(default)]
    pub content: String,
    pub role: MessageRole,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: i64,
    pub user_message: Message,
    pub assistant_message: Message,
}

/// Query string for `GET /api/messages/`.
#[derive(Debug, Default, Deserialize)]
pub struct MessageFilter {
    pub conversation: Option<i64>,
}
