//! OpenAI-compatible chat backend (OpenAI, DeepSeek)

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
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Chat client for any `/chat/completions`-style API
pub struct OpenAiCompatChat {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    label: String,
    provider_tag: &'static str,
    max_retries: u32,
}

impl OpenAiCompatChat {
    /// Hosted OpenAI backend
    pub fn openai(config: &LlmConfig) -> Self {
        Self::with_base(
            config,
            "https://api.openai.com/v1",
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            "openai",
        )
    }

    /// Hosted DeepSeek backend (OpenAI-compatible wire protocol)
    pub fn deepseek(config: &LlmConfig) -> Self {
        Self::with_base(
            config,
            "https://api.deepseek.com/v1",
            config.deepseek_api_key.clone(),
            config.deepseek_model.clone(),
            "deepseek",
        )
    }

    fn with_base(
        config: &LlmConfig,
        base_url: &str,
        api_key: String,
        model: String,
        provider_tag: &'static str,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
            label: model.clone(),
            model,
            provider_tag,
            max_retries: config.max_retries,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatChat {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(Error::LlmUnavailable);
        }

        let url = format!("{}/chat/completions", self.base_url);
        let messages = wire_messages(request);

        retry_with_backoff(self.max_retries, || {
            let url = url.clone();
            let body = ChatRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                temperature: request.temperature,
                max_tokens: request.max_tokens,
            };
            let client = self.client.clone();
            let api_key = self.api_key.clone();

            async move {
                let response = client
                    .post(&url)
                    .bearer_auth(api_key)
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

                parsed
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .ok_or_else(|| Error::Llm("response contained no choices".to_string()))
            }
        })
        .await
    }

    /// Available means a request can be constructed: the key is present.
    async fn health_check(&self) -> Result<bool> {
        Ok(!self.api_key.is_empty())
    }

    fn id(&self) -> &str {
        &self.model
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn provider(&self) -> &str {
        self.provider_tag
    }
}
