//! Embedding providers and the batching gateway

mod gateway;
pub mod ollama;

pub use gateway::EmbedderGateway;
pub use ollama::OllamaEmbedder;

use async_trait::async_trait;

use crate::error::Result;

/// Trait for generating text embeddings
///
/// Implementations:
/// - [`OllamaEmbedder`]: local Ollama server (nomic-embed-text or similar)
/// - test fakes with deterministic vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding dimensions (e.g. 768 for nomic-embed-text)
    fn dimensions(&self) -> usize;

    /// Check if the provider is healthy and reachable
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
