use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::error;

use crate::db::MessageStore;
use crate::errors::AppError;
use crate::models::{Message, MessageRole};

const MESSAGE_COLUMNS: &str = "id, conversation_id, role, content, created_at";

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn find_by_conversation_id(
        &self,
        conversation_id: i64,
    ) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS}
             FROM messages
             WHERE conversation_id = $1
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch messages for conversation {conversation_id}: {e}");
            AppError::db_query(
                format!("Failed to fetch messages for conversation {conversation_id}"),
                e,
            )
        })?;

        rows.iter().map(message_from_row).collect()
    }

    async fn find_by_conversation_ids(
        &self,
        conversation_ids: &[i64],
    ) -> Result<Vec<Message>, AppError> {
        if conversation_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS}
             FROM messages
             WHERE conversation_id = ANY($1)
             ORDER BY conversation_id, created_at ASC, id ASC"
        ))
        .bind(conversation_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch messages for {} conversations: {e}", conversation_ids.len());
            AppError::db_query("Failed to fetch messages", e)
        })?;

        rows.iter().map(message_from_row).collect()
    }

    async fn find_all(&self) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch all messages: {e}");
            AppError::db_query("Failed to fetch messages", e)
        })?;

        rows.iter().map(message_from_row).collect()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError> {
        let row = sqlx::query(&format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to find message {id}: {e}");
                AppError::db_query(format!("Failed to find message {id}"), e)
            })?;

        row.as_ref().map(message_from_row).transpose()
    }

    async fn create(
        &self,
        conversation_id: i64,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, AppError> {
        let row = sqlx::query(&format!(
            "INSERT INTO messages (conversation_id, role, content, created_at)
             VALUES ($1, $2, $3, now())
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(conversation_id)
        .bind(role.as_str())
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save {role} message for conversation {conversation_id}: {e}");
            AppError::db_query("Failed to save message", e)
        })?;

        message_from_row(&row)
    }
}

fn message_from_row(row: &PgRow) -> Result<Message, AppError> {
    let role_str: String = row
        .try_get("role")
        .map_err(|e| AppError::db_query("Failed to read role", e))?;
    let role = MessageRole::try_from(role_str)
        .map_err(|e| AppError::Unexpected(format!("Unknown message role: {e}")))?;
    Ok(Message {
        id: row.try_get("id").map_err(|e| AppError::db_query("Failed to read id", e))?,
        conversation_id: row
            .try_get("conversation_id")
            .map_err(|e| AppError::db_query("Failed to read conversation_id", e))?,
        role,
        content: row
            .try_get("content")
            .map_err(|e| AppError::db_query("Failed to read content", e))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| AppError::db_query("Failed to read created_at", e))?,
    })
}
