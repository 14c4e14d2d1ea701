//! Health, model selection and statistics endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::llm::ModelInfo;
use crate::server::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub documents_loaded: usize,
    pub total_chunks: usize,
    pub available_models: Vec<String>,
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        documents_loaded: state.index().count_documents(),
        total_chunks: state.index().count_chunks(),
        available_models: state
            .llm()
            .available_models()
            .into_iter()
            .map(|m| m.id)
            .collect(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub current_model: Option<String>,
}

/// GET /api/models
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.llm().available_models(),
        current_model: state.llm().current_model(),
    })
}

#[derive(Deserialize)]
pub struct SetModelRequest {
    pub model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetModelResponse {
    pub success: bool,
    pub current_model: String,
}

/// POST /api/models/set
pub async fn set_model(
    State(state): State<AppState>,
    Json(request): Json<SetModelRequest>,
) -> Result<Json<SetModelResponse>> {
    let current_model = state.llm().set_active(&request.model)?;
    tracing::info!("active model set to '{}'", current_model);
    Ok(Json(SetModelResponse {
        success: true,
        current_model,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub documents: usize,
    pub chunks: usize,
    pub conversations: usize,
    pub current_model: Option<String>,
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        documents: state.index().count_documents(),
        chunks: state.index().count_chunks(),
        conversations: state.conversations().len(),
        current_model: state.llm().current_model(),
    })
}
