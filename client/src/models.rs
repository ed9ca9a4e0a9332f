use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id carried by a conversation that only exists locally.
pub const DRAFT_CONVERSATION_ID: i64 = -1;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
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

/// Matches the backend `Message` shape. Immutable once received.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Message {
    pub id: i64,
    pub content: String,
    pub role: MessageRole,
    pub created_at: DateTime<Utc>,
}

/// Matches the backend `Conversation` shape, plus the local draft flag.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Conversation {
    pub id: i64,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub is_draft: bool,
}

impl Conversation {
    /// An unsaved conversation, promoted to a real one on its first message.
    pub fn draft() -> Self {
        let now = Utc::now();
        Self {
            id: DRAFT_CONVERSATION_ID,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            is_draft: true,
        }
    }
}

/// Envelope returned by `GET /conversations/`.
#[derive(Clone, Debug, Deserialize)]
pub struct ConversationPage {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Conversation>,
}

/// Request body for the chat API.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub content: &'a str,
}

/// Response from the chat API: both persisted messages in one round trip.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub conversation_id: i64,
    pub user_message: Message,
    pub assistant_message: Message,
}
