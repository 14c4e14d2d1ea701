//! Language model backends and provider selection

pub mod gateway;
pub mod ollama;
pub mod openai;

pub use gateway::LlmGateway;
pub use ollama::OllamaChat;
pub use openai::OpenAiCompatChat;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Message, Role};

/// Hard cap on history messages sent to any backend
pub const HISTORY_LIMIT: usize = 6;

/// One completion request: system prompt, trailing history, user query
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub history: Vec<Message>,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Trait over chat completion backends
///
/// Implementations:
/// - [`OllamaChat`]: local Ollama server
/// - [`OpenAiCompatChat`]: OpenAI and DeepSeek (same wire protocol)
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for the request
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Whether the backend can currently serve requests
    async fn health_check(&self) -> Result<bool>;

    /// Stable model id used for selection (e.g. "ollama-llama3.2")
    fn id(&self) -> &str;

    /// Human-readable label
    fn label(&self) -> &str;

    /// Provider tag ("ollama", "openai", "deepseek")
    fn provider(&self) -> &str;
}

/// Model descriptor returned by the models endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
}

/// Chat message in the wire format every backend speaks
#[derive(Debug, Clone, Serialize)]
pub(crate) struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

/// Flatten a completion request into wire messages: system prompt, then the
/// most recent [`HISTORY_LIMIT`] history entries, then the user query.
pub(crate) fn wire_messages(request: &CompletionRequest) -> Vec<WireMessage> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);

    if !request.system.is_empty() {
        messages.push(WireMessage {
            role: "system",
            content: request.system.clone(),
        });
    }

    let tail = request
        .history
        .len()
        .saturating_sub(HISTORY_LIMIT);
    for message in &request.history[tail..] {
        messages.push(WireMessage {
            role: match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: message.content.clone(),
        });
    }

    messages.push(WireMessage {
        role: "user",
        content: request.user.clone(),
    });

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_truncated_to_the_limit() {
        let history: Vec<Message> = (0..10).map(|i| Message::user(format!("m{}", i))).collect();
        let request = CompletionRequest {
            system: "sys".to_string(),
            history,
            user: "question".to_string(),
            temperature: 0.3,
            max_tokens: None,
        };

        let wire = wire_messages(&request);
        // system + 6 history + user
        assert_eq!(wire.len(), 8);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[1].content, "m4");
        assert_eq!(wire.last().unwrap().content, "question");
    }

    #[test]
    fn empty_system_prompt_is_omitted() {
        let request = CompletionRequest {
            system: String::new(),
            history: Vec::new(),
            user: "hi".to_string(),
            temperature: 0.7,
            max_tokens: None,
        };
        let wire = wire_messages(&request);
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].role, "user");
    }
}
