//! Mock gateway for store tests.
//!
//! Responses are queued per operation and every call is recorded, so tests
//! can assert both on resulting state and on the exact Gateway traffic.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::oneshot;

use crate::api::ChatGateway;
use crate::errors::ApiError;
use crate::models::{ChatResponse, Conversation, Message, MessageRole};

/// One recorded Gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Create,
    Get(i64),
    List,
    Send(i64, String),
    Delete(i64),
}

/// Gateway that returns queued responses and records every call.
#[derive(Default)]
pub struct MockGateway {
    creates: Mutex<VecDeque<Result<Conversation, ApiError>>>,
    gets: Mutex<VecDeque<Result<Conversation, ApiError>>>,
    lists: Mutex<VecDeque<Result<Vec<Conversation>, ApiError>>>,
    sends: Mutex<VecDeque<Result<ChatResponse, ApiError>>>,
    deletes: Mutex<VecDeque<Result<(), ApiError>>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    calls: Mutex<Vec<GatewayCall>>,
}

fn next<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>) -> Result<T, ApiError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(ApiError::Other("No mock response queued".into())))
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_create(&self, response: Result<Conversation, ApiError>) {
        self.creates.lock().unwrap().push_back(response);
    }

    pub fn queue_get(&self, response: Result<Conversation, ApiError>) {
        self.gets.lock().unwrap().push_back(response);
    }

    pub fn queue_list(&self, response: Result<Vec<Conversation>, ApiError>) {
        self.lists.lock().unwrap().push_back(response);
    }

    pub fn queue_send(&self, response: Result<ChatResponse, ApiError>) {
        self.sends.lock().unwrap().push_back(response);
    }

    pub fn queue_delete(&self, response: Result<(), ApiError>) {
        self.deletes.lock().unwrap().push_back(response);
    }

    /// Makes the next call wait until the returned sender fires.
    pub fn hold_next_call(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn recorded_calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

#[async_trait]
impl ChatGateway for MockGateway {
    async fn create_conversation(&self) -> Result<Conversation, ApiError> {
        self.record(GatewayCall::Create).await;
        next(&self.creates)
    }

    async fn get_conversation(&self, id: i64) -> Result<Conversation, ApiError> {
        self.record(GatewayCall::Get(id)).await;
        next(&self.gets)
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.record(GatewayCall::List).await;
        next(&self.lists)
    }

    async fn send_message(
        &self,
        conversation_id: i64,
        content: &str,
    ) -> Result<ChatResponse, ApiError> {
        self.record(GatewayCall::Send(conversation_id, content.to_string())).await;
        next(&self.sends)
    }

    async fn delete_conversation(&self, id: i64) -> Result<(), ApiError> {
        self.record(GatewayCall::Delete(id)).await;
        next(&self.deletes)
    }
}

// ── Fixtures ──────────────────────────────────────────────────────────────────

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_740_000_000 + secs, 0).single().unwrap()
}

pub fn message(id: i64, role: MessageRole, content: &str) -> Message {
    Message { id, content: content.to_string(), role, created_at: at(id) }
}

pub fn conversation(id: i64, updated_secs: i64, messages: Vec<Message>) -> Conversation {
    Conversation {
        id,
        messages,
        created_at: at(0),
        updated_at: at(updated_secs),
        is_draft: false,
    }
}

pub fn chat_response(conversation_id: i64, user_id: i64, text: &str, reply: &str) -> ChatResponse {
    ChatResponse {
        conversation_id,
        user_message: message(user_id, MessageRole::User, text),
        assistant_message: message(user_id + 1, MessageRole::Assistant, reply),
    }
}

pub fn server_error(message: &str) -> ApiError {
    ApiError::Server { status: 400, message: message.to_string() }
}
