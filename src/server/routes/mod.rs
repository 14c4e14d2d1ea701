//! API routes for the chat service

pub mod chat;
pub mod documents;
pub mod system;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all routes under `/api`
pub fn api_routes(upload_body_limit: usize) -> Router<AppState> {
    Router::new()
        // System
        .route("/health", get(system::health))
        .route("/models", get(system::list_models))
        .route("/models/set", post(system::set_model))
        .route("/stats", get(system::stats))
        // Documents - the upload route gets a larger body limit
        .route(
            "/documents/upload",
            post(documents::upload).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/documents/url", post(documents::ingest_url))
        .route("/documents", get(documents::list))
        .route("/documents/:id", delete(documents::delete))
        .route("/documents/clear", post(documents::clear))
        // Chat and search
        .route("/chat", post(chat::chat))
        .route("/search", post(chat::search))
        // Conversations
        .route("/conversations/:id", get(chat::get_conversation))
        .route("/conversations/:id", delete(chat::delete_conversation))
}
