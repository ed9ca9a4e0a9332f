use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Top-level application error.
/// All variants carry a human-readable message for display/logging.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Database errors ──────────────────────────────────────────────────────
    #[error("Database query failed: {message}")]
    DatabaseQueryFailed {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    // ── AI Agent errors ──────────────────────────────────────────────────────
    #[error("Ollama service unavailable at {host}")]
    OllamaUnavailable { host: String },

    #[error("Model '{model_name}' not found in Ollama")]
    ModelNotFound { model_name: String },

    #[error("Inference error: {message}")]
    InferenceError { message: String },

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Message content is required")]
    MissingContent,

    #[error("Field '{field_name}' exceeds max length of {max_length} (actual: {actual_length})")]
    FieldTooLong { field_name: String, max_length: usize, actual_length: usize },

    // ── Lookup errors ────────────────────────────────────────────────────────
    #[error("Conversation '{id}' not found")]
    ConversationNotFound { id: i64 },

    #[error("Message '{id}' not found")]
    MessageNotFound { id: i64 },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn db_query(message: impl Into<String>, source: sqlx::Error) -> Self {
        AppError::DatabaseQueryFailed { message: message.into(), source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::ConversationNotFound { .. } | AppError::MessageNotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::MissingContent | AppError::FieldTooLong { .. })
    }

    pub fn is_agent_failure(&self) -> bool {
        matches!(
            self,
            AppError::OllamaUnavailable { .. }
                | AppError::ModelNotFound { .. }
                | AppError::InferenceError { .. }
        )
    }

    pub fn status(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else if matches!(self, AppError::OllamaUnavailable { .. }) {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Error bodies follow the client's contract: lookups answer with
/// `{"detail": ...}`, everything else with `{"error": ...}`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if self.is_not_found() {
            json!({ "detail": "Not found." })
        } else if self.is_agent_failure() {
            json!({ "error": format!("Failed to get chatbot response: {self}") })
        } else {
            json!({ "error": self.to_string() })
        };

        if status.is_server_error() {
            error!("Request failed with {status}: {self}");
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_conversation_maps_to_detail_404() {
        let (status, body) = body_of(AppError::ConversationNotFound { id: 9 }).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "detail": "Not found." }));
    }

    #[tokio::test]
    async fn empty_content_maps_to_error_400() {
        let (status, body) = body_of(AppError::MissingContent).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message content is required");
    }

    #[tokio::test]
    async fn agent_failures_are_prefixed() {
        let (status, body) =
            body_of(AppError::InferenceError { message: "boom".into() }).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to get chatbot response: Inference error: boom");

        let (status, _) =
            body_of(AppError::OllamaUnavailable { host: "http://x".into() }).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
