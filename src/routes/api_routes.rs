use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::errors::AppError;
use crate::models::{AddMessageRequest, ChatRequest, MessageFilter, Page};
use crate::service::chat_service::ChatService;

// ── Conversations ─────────────────────────────────────────────────────────────

/// GET `/api/conversations/`: every conversation with its messages, newest first
pub async fn list_conversations_handler(
    State(svc): State<ChatService>,
) -> Result<impl IntoResponse, AppError> {
    let conversations = svc.list_conversations().await?;
    Ok(Json(Page::single(conversations)))
}

/// POST `/api/conversations/`: create an empty conversation
pub async fn create_conversation_handler(
    State(svc): State<ChatService>,
) -> Result<impl IntoResponse, AppError> {
    let conversation = svc.create_conversation().await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// GET `/api/conversations/{id}/`: one conversation with its messages
pub async fn get_conversation_handler(
    Path(id): Path<i64>,
    State(svc): State<ChatService>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(svc.get_conversation(id).await?))
}

/// DELETE `/api/conversations/{id}/`
pub async fn delete_conversation_handler(
    Path(id): Path<i64>,
    State(svc): State<ChatService>,
) -> Result<impl IntoResponse, AppError> {
    svc.delete_conversation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/api/conversations/{id}/chat/`: store the user message and the assistant reply
pub async fn chat_handler(
    Path(id): Path<i64>,
    State(svc): State<ChatService>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(svc.chat(id, request).await?))
}

/// POST `/api/conversations/{id}/add_message/`: store a message verbatim
pub async fn add_message_handler(
    Path(id): Path<i64>,
    State(svc): State<ChatService>,
    Json(request): Json<AddMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = svc.add_message(id, request).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// GET `/api/messages/?conversation={id}`
pub async fn list_messages_handler(
    Query(filter): Query<MessageFilter>,
    State(svc): State<ChatService>,
) -> Result<impl IntoResponse, AppError> {
    let messages = svc.list_messages(filter.conversation).await?;
    Ok(Json(Page::single(messages)))
}

/// GET `/api/messages/{id}/`
pub async fn get_message_handler(
    Path(id): Path<i64>,
    State(svc): State<ChatService>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(svc.get_message(id).await?))
}
