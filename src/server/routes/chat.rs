//! Chat, search and conversation endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::Conversation;
use crate::error::{Error, Result};
use crate::retrieval::DEFAULT_TOP_K;
use crate::server::state::AppState;
use crate::types::{AnswerMode, ChatMode, SourceRef};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// One of "auto", "rag", "general"; defaults to auto
    #[serde(default)]
    pub mode: Option<String>,
    /// Accepted for compatibility; responses are always unary
    #[serde(default)]
    pub streaming: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub conversation_id: String,
    pub answer: String,
    pub mode: AnswerMode,
    pub sources: Vec<SourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieved_count: Option<usize>,
    #[serde(skip_serializing_if = "is_false")]
    pub no_relevant_results: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    if request.message.trim().is_empty() {
        return Err(Error::InvalidRequest("message is required".to_string()));
    }

    let mode = match &request.mode {
        None => ChatMode::Auto,
        Some(raw) => ChatMode::parse(raw)
            .ok_or_else(|| Error::InvalidRequest(format!("unknown mode: {}", raw)))?,
    };

    let conversation_id = request
        .conversation_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    tracing::info!(
        "chat [{}] mode={:?}: \"{}\"",
        conversation_id,
        mode,
        crate::util::truncate_chars(&request.message, 80)
    );

    // Snapshot the window before appending so the model sees the current
    // query exactly once (as the final user message of the prompt).
    let history = state
        .conversations()
        .last_n(&conversation_id, state.config().router.history_window);
    state
        .conversations()
        .append_user(&conversation_id, &request.message);

    let outcome = state.router().route(&request.message, mode, &history).await?;

    state.conversations().append_assistant(
        &conversation_id,
        &outcome.answer,
        outcome.mode,
        &outcome.sources,
    );

    Ok(Json(ChatResponse {
        conversation_id,
        answer: outcome.answer,
        mode: outcome.mode,
        sources: outcome.sources,
        retrieved_count: outcome.retrieved_count,
        no_relevant_results: outcome.no_relevant_results,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub doc_id: Uuid,
    pub content: String,
    pub source: String,
    pub chunk_index: usize,
    pub score: f32,
    pub vector_score: f32,
    pub keyword_score: f32,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

/// POST /api/search - direct hybrid search without answer generation
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    if request.query.trim().is_empty() {
        return Err(Error::InvalidRequest("query is required".to_string()));
    }

    let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K);
    let hits = state.index().hybrid_search(&request.query, top_k).await?;

    let results = hits
        .into_iter()
        .map(|hit| SearchResult {
            id: hit.id,
            doc_id: hit.doc_id,
            content: hit.content,
            source: hit.metadata.source,
            chunk_index: hit.metadata.chunk_index,
            score: hit.score,
            vector_score: hit.vector_score,
            keyword_score: hit.keyword_score,
        })
        .collect();

    Ok(Json(SearchResponse { results }))
}

/// GET /api/conversations/:id
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>> {
    state
        .conversations()
        .get(&id)
        .map(Json)
        .ok_or(Error::ConversationNotFound(id))
}

#[derive(Serialize)]
pub struct DeleteConversationResponse {
    pub success: bool,
}

/// DELETE /api/conversations/:id
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteConversationResponse>> {
    if state.conversations().remove(&id) {
        Ok(Json(DeleteConversationResponse { success: true }))
    } else {
        Err(Error::ConversationNotFound(id))
    }
}
