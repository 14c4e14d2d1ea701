//! Error types for the RAG chat service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Service errors
///
/// Disposition rules: user-caused problems map to 4xx, transient backend
/// problems to 5xx. Semantic "I couldn't help" outcomes (empty corpus in
/// grounded mode, nothing above the fallback threshold) are not errors and
/// never appear here; the chat router reports them as normal responses.
#[derive(Debug, Error)]
pub enum Error {
    /// File extension not handled by any extractor
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A supported format failed to decode
    #[error("Failed to extract '{name}': {message}")]
    ExtractFailed { name: String, message: String },

    /// URL ingestion failed (network, status, or decode)
    #[error("Failed to fetch '{url}': {message}")]
    FetchFailed { url: String, message: String },

    /// The embedding backend could not produce a vector
    #[error("Embedder unavailable: {0}")]
    EmbedderUnavailable(String),

    /// No language model backend is usable right now
    #[error("No language model backend is available")]
    LlmUnavailable,

    /// A language model call failed after backend selection
    #[error("LLM error: {0}")]
    Llm(String),

    /// Unknown document id on delete or lookup
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Unknown conversation id
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// Malformed or incomplete client request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extract(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExtractFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a fetch error
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, kind, details) = match &self {
            Error::UnsupportedFormat(ext) => (
                StatusCode::BAD_REQUEST,
                "unsupported_format",
                format!("Unsupported file type: {}", ext),
            ),
            Error::ExtractFailed { name, message } => (
                StatusCode::BAD_REQUEST,
                "extract_failed",
                format!("Failed to extract '{}': {}", name, message),
            ),
            Error::FetchFailed { url, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "fetch_failed",
                format!("Failed to fetch '{}': {}", url, message),
            ),
            Error::EmbedderUnavailable(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "embedder_unavailable",
                msg.clone(),
            ),
            Error::LlmUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "llm_unavailable",
                self.to_string(),
            ),
            Error::Llm(msg) => (StatusCode::BAD_GATEWAY, "llm_error", msg.clone()),
            Error::DocumentNotFound(id) => (
                StatusCode::BAD_REQUEST,
                "document_not_found",
                format!("Document not found: {}", id),
            ),
            Error::ConversationNotFound(id) => (
                StatusCode::NOT_FOUND,
                "conversation_not_found",
                format!("Conversation not found: {}", id),
            ),
            Error::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg.clone()),
            Error::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", msg.clone()),
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Http(err) => (StatusCode::BAD_GATEWAY, "http_error", err.to_string()),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
        };

        let body = Json(json!({
            "error": kind,
            "details": details,
        }));

        (status, body).into_response()
    }
}
