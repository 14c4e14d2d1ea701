//! Ollama embedding provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::util::retry_with_backoff;

use super::EmbeddingProvider;

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Embedding client for a local Ollama server
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
    max_retries: u32,
}

impl OllamaEmbedder {
    pub fn new(config: &RagConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: config.llm.ollama_base_url.clone(),
            model: config.embedding.model.clone(),
            dimensions: config.embedding.dimensions,
            max_retries: config.llm.max_retries,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        retry_with_backoff(self.max_retries, || {
            let url = url.clone();
            let request = EmbedRequest {
                model: self.model.clone(),
                prompt: text.to_string(),
            };
            let client = self.client.clone();

            async move {
                let response = client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::EmbedderUnavailable(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(Error::EmbedderUnavailable(format!(
                        "embedding failed: HTTP {}",
                        response.status()
                    )));
                }

                let parsed: EmbedResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::EmbedderUnavailable(e.to_string()))?;

                Ok(parsed.embedding)
            }
        })
        .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
