use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{ApiError, SERVER_ERROR_FALLBACK};
use crate::models::{ChatRequest, ChatResponse, Conversation, ConversationPage};

/// Default base URL of the backend API server.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";

/// The five backend operations the Store depends on.
///
/// Each call is one request/response exchange. Implementations never retry
/// and never cache.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Creates an empty persisted conversation.
    async fn create_conversation(&self) -> Result<Conversation, ApiError>;

    /// Fetches one conversation with its messages in chronological order.
    async fn get_conversation(&self, id: i64) -> Result<Conversation, ApiError>;

    /// Fetches every persisted conversation.
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    /// Posts a user message and returns it together with the assistant reply.
    async fn send_message(&self, conversation_id: i64, content: &str)
        -> Result<ChatResponse, ApiError>;

    async fn delete_conversation(&self, id: i64) -> Result<(), ApiError>;
}

/// Error payload the backend attaches to failed responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

/// Picks the message out of an error body: `error` first, then `detail`.
fn server_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.detail))
        .unwrap_or_else(|| SERVER_ERROR_FALLBACK.to_string())
}

/// [`ChatGateway`] over HTTP/JSON.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends the request and turns every non-success outcome into an [`ApiError`].
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let resp = request.send().await.map_err(|e| {
            if e.is_builder() {
                ApiError::Other(e.to_string())
            } else {
                warn!("Request failed before a response arrived: {e}");
                ApiError::Network
            }
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = server_message(&body);
        warn!("Server answered {status}: {message}");
        Err(ApiError::Server { status: status.as_u16(), message })
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Other(format!("Parse error: {e}")))
    }
}

#[async_trait]
impl ChatGateway for HttpGateway {
    async fn create_conversation(&self) -> Result<Conversation, ApiError> {
        debug!("Creating conversation");
        let request = self
            .client
            .post(self.url("/conversations/"))
            .json(&serde_json::json!({}));
        self.fetch(request).await
    }

    async fn get_conversation(&self, id: i64) -> Result<Conversation, ApiError> {
        debug!("Fetching conversation {id}");
        self.fetch(self.client.get(self.url(&format!("/conversations/{id}/"))))
            .await
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        debug!("Fetching conversation list");
        let page: ConversationPage =
            self.fetch(self.client.get(self.url("/conversations/"))).await?;
        Ok(page.results)
    }

    async fn send_message(
        &self,
        conversation_id: i64,
        content: &str,
    ) -> Result<ChatResponse, ApiError> {
        debug!("Posting message to conversation {conversation_id}");
        let request = self
            .client
            .post(self.url(&format!("/conversations/{conversation_id}/chat/")))
            .json(&ChatRequest { content });
        self.fetch(request).await
    }

    async fn delete_conversation(&self, id: i64) -> Result<(), ApiError> {
        debug!("Deleting conversation {id}");
        self.execute(self.client.delete(self.url(&format!("/conversations/{id}/"))))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins_over_detail() {
        assert_eq!(server_message(r#"{"error": "bad", "detail": "worse"}"#), "bad");
        assert_eq!(server_message(r#"{"detail": "Not found."}"#), "Not found.");
    }

    #[test]
    fn unrecognised_bodies_use_fallback() {
        assert_eq!(server_message(""), SERVER_ERROR_FALLBACK);
        assert_eq!(server_message("<html>502</html>"), SERVER_ERROR_FALLBACK);
        assert_eq!(server_message(r#"{"content": ["required"]}"#), SERVER_ERROR_FALLBACK);
    }

    #[test]
    fn trailing_slash_is_normalised() {
        let gw = HttpGateway::new("http://localhost:8000/api/");
        assert_eq!(gw.url("/conversations/"), "http://localhost:8000/api/conversations/");
    }
}
