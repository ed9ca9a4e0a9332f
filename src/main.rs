mod agent;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod service;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::OllamaAgentService;
use crate::config::Config;
use crate::db::conversation_repository::ConversationRepository;
use crate::db::message_repository::MessageRepository;
use crate::routes::api_routes::{
    add_message_handler, chat_handler, create_conversation_handler, delete_conversation_handler,
    get_conversation_handler, get_message_handler, list_conversations_handler,
    list_messages_handler,
};
use crate::service::chat_service::ChatService;

fn build_router(chat_service: ChatService) -> Router {
    Router::new()
        .route(
            "/api/conversations/",
            get(list_conversations_handler).post(create_conversation_handler),
        )
        .route(
            "/api/conversations/{id}/",
            get(get_conversation_handler).delete(delete_conversation_handler),
        )
        .route("/api/conversations/{id}/chat/", post(chat_handler))
        .route(
            "/api/conversations/{id}/add_message/",
            post(add_message_handler),
        )
        .route("/api/messages/", get(list_messages_handler))
        .route("/api/messages/{id}/", get(get_message_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(chat_service)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shoepao_chat=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // ── Database ──────────────────────────────────────────────────────────────
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Database connection established and migrations applied");

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let conversation_repo = Arc::new(ConversationRepository::new(pool.clone()));
    let message_repo = Arc::new(MessageRepository::new(pool.clone()));
    let agent = Arc::new(OllamaAgentService::new(&config.ollama_base_url, &config.model)?);
    let chat_service = ChatService::new(conversation_repo, message_repo, agent);

    info!("Assistant model '{}' at {}", config.model, config.ollama_base_url);

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/api/");

    axum::serve(listener, build_router(chat_service)).await?;
    Ok(())
}
