//! Ollama chat backend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::util::retry_with_backoff;

use super::{wire_messages, ChatModel, CompletionRequest, WireMessage};

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Chat client for a local Ollama server
pub struct OllamaChat {
    client: Client,
    base_url: String,
    model: String,
    id: String,
    label: String,
    max_retries: u32,
}

impl OllamaChat {
    pub fn new(config: &LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: config.ollama_base_url.clone(),
            model: config.ollama_model.clone(),
            id: format!("ollama-{}", config.ollama_model),
            label: format!("{} (Ollama)", config.ollama_model),
            max_retries: config.max_retries,
        }
    }
}

#[async_trait]
impl ChatModel for OllamaChat {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let messages = wire_messages(request);

        retry_with_backoff(self.max_retries, || {
            let url = url.clone();
            let body = ChatRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                stream: false,
                options: ChatOptions {
                    temperature: request.temperature,
                    num_predict: request.max_tokens,
                },
            };
            let client = self.client.clone();

            async move {
                let response = client
                    .post(&url)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| Error::Llm(format!("chat request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let detail = response.text().await.unwrap_or_default();
                    return Err(Error::Llm(format!(
                        "chat failed: HTTP {} - {}",
                        status, detail
                    )));
                }

                let parsed: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::Llm(format!("failed to parse chat response: {}", e)))?;

                Ok(parsed.message.content)
            }
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn provider(&self) -> &str {
        "ollama"
    }
}
