use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::ChatGateway;
use crate::errors::ChatError;
use crate::models::{ChatResponse, Conversation, Message};
use crate::view;

const LOAD_CONVERSATIONS_FAILED: &str = "Failed to load conversations";
const LOAD_CONVERSATION_FAILED: &str = "Failed to load conversation";
const SEND_MESSAGE_FAILED: &str = "Failed to send message";
const DELETE_CONVERSATION_FAILED: &str = "Failed to delete conversation";

/// Everything the UI renders from.
///
/// The message sequence is the current conversation's own `messages`, so the
/// two can never diverge.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatState {
    pub conversations: Vec<Conversation>,
    pub current: Option<Conversation>,
    /// Single coarse flag shared by every backend-facing operation.
    pub loading: bool,
    pub error: Option<String>,
    pub search_query: String,
}

impl ChatState {
    pub fn messages(&self) -> &[Message] {
        self.current.as_ref().map(|c| c.messages.as_slice()).unwrap_or_default()
    }

    /// The conversation list after search filtering and recency sorting.
    pub fn visible_conversations(&self) -> Vec<&Conversation> {
        view::filter_and_sort(&self.conversations, &self.search_query)
    }
}

/// Marks an operation as in flight; clears the flag when dropped, whatever
/// path the operation leaves by.
struct InFlight<'a> {
    state: &'a watch::Sender<ChatState>,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a watch::Sender<ChatState>) -> Self {
        state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        Self { state }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.loading = false);
    }
}

/// Conversation/message state kept in step with the backend.
///
/// Create one per application and pass it to whatever renders. Operations
/// take `&self`; overlapping calls are not serialised, the last one to
/// write a field wins. Callers that need stronger guarantees must avoid
/// issuing a new operation while `loading` is set.
pub struct ChatStore<G> {
    gateway: G,
    state: watch::Sender<ChatState>,
}

impl<G: ChatGateway> ChatStore<G> {
    pub fn new(gateway: G) -> Self {
        let (state, _) = watch::channel(ChatState::default());
        Self { gateway, state }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> ChatState {
        self.state.borrow().clone()
    }

    /// A receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    fn fail(&self, err: &ChatError, fallback: &str) {
        let message = err.user_message(fallback);
        warn!("{fallback}: {message}");
        self.state.send_modify(|s| s.error = Some(message));
    }

    async fn refresh_conversations(&self) -> Result<(), ChatError> {
        let conversations = self.gateway.list_conversations().await?;
        debug!("Loaded {} conversations", conversations.len());
        self.state.send_modify(|s| s.conversations = conversations);
        Ok(())
    }

    /// Replaces the conversation list with the backend's. On failure the
    /// previous list is kept.
    pub async fn load_conversations(&self) {
        let _in_flight = InFlight::begin(&self.state);
        if let Err(e) = self.refresh_conversations().await {
            self.fail(&e, LOAD_CONVERSATIONS_FAILED);
        }
    }

    /// Starts a new, unsaved conversation. Any previous draft is discarded.
    pub fn create_draft(&self) {
        self.state.send_modify(|s| {
            s.current = Some(Conversation::draft());
            s.error = None;
        });
    }

    pub async fn select_conversation(&self, id: i64) {
        let _in_flight = InFlight::begin(&self.state);
        match self.gateway.get_conversation(id).await {
            Ok(conversation) => self.state.send_modify(|s| s.current = Some(conversation)),
            Err(e) => self.fail(&ChatError::from(e), LOAD_CONVERSATION_FAILED),
        }
    }

    /// Ensures the current conversation exists on the backend and returns its id.
    ///
    /// A draft is replaced by a freshly created conversation; this is the only
    /// place a draft is ever persisted, and it cannot happen twice because the
    /// replacement is no longer a draft.
    pub async fn promote_if_draft(&self) -> Result<i64, ChatError> {
        let (id, is_draft) = {
            let state = self.state.borrow();
            let current = state.current.as_ref().ok_or(ChatError::NoConversationSelected)?;
            (current.id, current.is_draft)
        };
        if !is_draft {
            return Ok(id);
        }

        let created = self.gateway.create_conversation().await?;
        let id = created.id;
        info!("Draft promoted to conversation {id}");
        self.state.send_modify(|s| s.current = Some(created));
        Ok(id)
    }

    /// Posts `content` to a persisted conversation and appends the user
    /// message and the assistant reply, in that order.
    pub async fn post_message(
        &self,
        conversation_id: i64,
        content: &str,
    ) -> Result<ChatResponse, ChatError> {
        let response = self.gateway.send_message(conversation_id, content).await?;
        self.state.send_modify(|s| {
            if let Some(current) = s.current.as_mut().filter(|c| c.id == conversation_id) {
                current.messages.push(response.user_message.clone());
                current.messages.push(response.assistant_message.clone());
                current.updated_at = Utc::now();
            }
        });
        Ok(response)
    }

    /// Sends `content` in the current conversation, promoting a draft first,
    /// then reloads the conversation list.
    ///
    /// A promotion that succeeded stays in place even if posting fails.
    pub async fn send_message(&self, content: &str) {
        let has_current = self.state.borrow().current.is_some();
        if !has_current {
            self.fail(&ChatError::NoConversationSelected, SEND_MESSAGE_FAILED);
            return;
        }

        let _in_flight = InFlight::begin(&self.state);
        let posted = match self.promote_if_draft().await {
            Ok(id) => self.post_message(id, content).await,
            Err(e) => Err(e),
        };

        match posted {
            Ok(_) => {
                if let Err(e) = self.refresh_conversations().await {
                    self.fail(&e, LOAD_CONVERSATIONS_FAILED);
                }
            }
            Err(e) => self.fail(&e, SEND_MESSAGE_FAILED),
        }
    }

    /// Deletes a conversation, clearing it locally only once the backend
    /// confirmed, then reloads the list.
    pub async fn delete_conversation(&self, id: i64) {
        let _in_flight = InFlight::begin(&self.state);
        if let Err(e) = self.gateway.delete_conversation(id).await {
            self.fail(&ChatError::from(e), DELETE_CONVERSATION_FAILED);
            return;
        }

        self.state.send_modify(|s| {
            if s.current.as_ref().is_some_and(|c| c.id == id) {
                s.current = None;
            }
        });
        if let Err(e) = self.refresh_conversations().await {
            self.fail(&e, LOAD_CONVERSATIONS_FAILED);
        }
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.state.send_modify(|s| s.search_query = query);
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }
}
