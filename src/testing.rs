//! In-memory stand-ins for the database and the model, for service and
//! router tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::agent::ReplyAgent;
use crate::db::{ConversationStore, MessageStore};
use crate::errors::AppError;
use crate::models::{Conversation, Message, MessageRole};
use crate::service::chat_service::ChatService;

/// Ordered record of every write and model call, shared by the fakes.
pub type EventLog = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct Tables {
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    last_id: i64,
    clock: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    /// Each call is one second after the previous one.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.timestamp_opt(1_740_000_000, 0).single().unwrap() + Duration::seconds(self.clock)
    }
}

/// Both stores over one set of tables, like the two repositories over one pool.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    events: EventLog,
}

impl InMemoryStore {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    /// Inserts a conversation directly, bypassing the event log.
    pub fn seed_conversation(&self) -> i64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        let at = t.tick();
        t.conversations.push(Conversation { id, created_at: at, updated_at: at });
        id
    }

    /// Inserts a message directly, bypassing the event log.
    pub fn seed_message(&self, conversation_id: i64, role: MessageRole, content: &str) -> i64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        let created_at = t.tick();
        t.messages.push(Message {
            id,
            conversation_id,
            content: content.to_string(),
            role,
            created_at,
        });
        id
    }

    pub fn conversation(&self, id: i64) -> Option<Conversation> {
        let t = self.tables.lock().unwrap();
        t.conversations.iter().find(|c| c.id == id).cloned()
    }

    pub fn messages_of(&self, conversation_id: i64) -> Vec<Message> {
        let t = self.tables.lock().unwrap();
        t.messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Conversation>, AppError> {
        let mut all = self.tables.lock().unwrap().conversations.clone();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Conversation>, AppError> {
        Ok(self.conversation(id))
    }

    async fn create(&self) -> Result<Conversation, AppError> {
        let id = self.seed_conversation();
        self.record(format!("create:{id}"));
        Ok(self.conversation(id).unwrap())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.conversations.len();
        t.conversations.retain(|c| c.id != id);
        t.messages.retain(|m| m.conversation_id != id);
        Ok(t.conversations.len() < before)
    }

    async fn update_timestamp(&self, id: i64) -> Result<(), AppError> {
        {
            let mut t = self.tables.lock().unwrap();
            let now = t.tick();
            if let Some(c) = t.conversations.iter_mut().find(|c| c.id == id) {
                c.updated_at = now;
            }
        }
        self.record(format!("touch:{id}"));
        Ok(())
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn find_by_conversation_id(
        &self,
        conversation_id: i64,
    ) -> Result<Vec<Message>, AppError> {
        Ok(self.messages_of(conversation_id))
    }

    async fn find_by_conversation_ids(
        &self,
        conversation_ids: &[i64],
    ) -> Result<Vec<Message>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.messages
            .iter()
            .filter(|m| conversation_ids.contains(&m.conversation_id))
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Message>, AppError> {
        Ok(self.tables.lock().unwrap().messages.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn create(
        &self,
        conversation_id: i64,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, AppError> {
        let id = self.seed_message(conversation_id, role, content);
        self.record(format!("message:{role}"));
        let t = self.tables.lock().unwrap();
        Ok(t.messages.iter().find(|m| m.id == id).cloned().unwrap())
    }
}

/// What the agent was asked: conversation, ids of the replayed history, user text.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyCall {
    pub conversation_id: i64,
    pub history: Vec<i64>,
    pub user_message: String,
}

/// Answers from a queue of canned results, "Sure thing!" once it runs dry.
pub struct ScriptedAgent {
    replies: Mutex<VecDeque<Result<String, AppError>>>,
    calls: Mutex<Vec<ReplyCall>>,
    events: EventLog,
}

impl ScriptedAgent {
    pub fn new(events: EventLog) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn queue(&self, reply: Result<String, AppError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<ReplyCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyAgent for ScriptedAgent {
    async fn reply(
        &self,
        conversation_id: i64,
        history: &[Message],
        user_message: &str,
    ) -> Result<String, AppError> {
        self.events.lock().unwrap().push("reply".to_string());
        self.calls.lock().unwrap().push(ReplyCall {
            conversation_id,
            history: history.iter().map(|m| m.id).collect(),
            user_message: user_message.to_string(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Sure thing!".to_string()))
    }
}

/// A service over a fresh in-memory store and a scripted agent sharing one event log.
pub fn service() -> (ChatService, InMemoryStore, Arc<ScriptedAgent>) {
    let store = InMemoryStore::default();
    let agent = Arc::new(ScriptedAgent::new(store.events.clone()));
    let svc = ChatService::new(Arc::new(store.clone()), Arc::new(store.clone()), agent.clone());
    (svc, store, agent)
}
