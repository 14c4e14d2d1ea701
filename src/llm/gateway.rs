//! Backend selection over the configured chat models
//!
//! Backends are ordered by preference: the local server first, then hosted
//! providers. When nothing is available the gateway reports degraded mode
//! instead of failing, and the router substitutes canned answers.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::{ChatModel, CompletionRequest, ModelInfo, OllamaChat, OpenAiCompatChat};

struct Backend {
    model: Arc<dyn ChatModel>,
    available: bool,
}

/// Uniform interface over the configured LLM backends
pub struct LlmGateway {
    backends: Vec<Backend>,
    active: RwLock<Option<String>>,
}

impl LlmGateway {
    /// Probe and register backends in preference order: local self-hosted
    /// first (if reachable), then hosted providers with credentials.
    pub async fn new(config: &LlmConfig) -> Self {
        let mut backends: Vec<Backend> = Vec::new();

        let ollama = OllamaChat::new(config);
        let reachable = ollama.health_check().await.unwrap_or(false);
        if !reachable {
            tracing::warn!("Ollama not reachable at {}", config.ollama_base_url);
        }
        backends.push(Backend {
            model: Arc::new(ollama),
            available: reachable,
        });

        if !config.openai_api_key.is_empty() {
            backends.push(Backend {
                model: Arc::new(OpenAiCompatChat::openai(config)),
                available: true,
            });
        }

        if !config.deepseek_api_key.is_empty() {
            backends.push(Backend {
                model: Arc::new(OpenAiCompatChat::deepseek(config)),
                available: true,
            });
        }

        Self::from_backends(
            backends
                .into_iter()
                .map(|b| (b.model, b.available))
                .collect(),
            &config.default_model,
        )
    }

    /// Build a gateway from prepared backends. Also the seam tests use to
    /// inject deterministic fakes.
    pub fn from_backends(backends: Vec<(Arc<dyn ChatModel>, bool)>, default_model: &str) -> Self {
        let backends: Vec<Backend> = backends
            .into_iter()
            .map(|(model, available)| Backend { model, available })
            .collect();

        let active = backends
            .iter()
            .find(|b| b.available && b.model.id() == default_model)
            .map(|b| b.model.id().to_string());

        Self {
            backends,
            active: RwLock::new(active),
        }
    }

    /// All registered models, usable or not
    pub fn available_models(&self) -> Vec<ModelInfo> {
        self.backends
            .iter()
            .map(|b| ModelInfo {
                id: b.model.id().to_string(),
                name: b.model.label().to_string(),
                provider: b.model.provider().to_string(),
            })
            .collect()
    }

    /// True when at least one backend can serve requests
    pub fn has_backend(&self) -> bool {
        self.backends.iter().any(|b| b.available)
    }

    /// Id of the model that would serve the next request, if any
    pub fn current_model(&self) -> Option<String> {
        if let Some(active) = self.active.read().clone() {
            return Some(active);
        }
        self.backends
            .iter()
            .find(|b| b.available)
            .map(|b| b.model.id().to_string())
    }

    /// Select the active model by id
    pub fn set_active(&self, id: &str) -> Result<String> {
        let backend = self
            .backends
            .iter()
            .find(|b| b.model.id() == id)
            .ok_or_else(|| Error::InvalidRequest(format!("unknown model: {}", id)))?;

        if !backend.available {
            return Err(Error::InvalidRequest(format!("model not available: {}", id)));
        }

        *self.active.write() = Some(id.to_string());
        Ok(id.to_string())
    }

    /// Complete against the active backend, falling back to the first
    /// available one. Signals degraded mode with [`Error::LlmUnavailable`]
    /// when nothing can serve the request.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let backend = self.pick_backend().ok_or(Error::LlmUnavailable)?;
        tracing::debug!("completing with model '{}'", backend.id());
        backend.complete(request).await
    }

    fn pick_backend(&self) -> Option<Arc<dyn ChatModel>> {
        let active = self.active.read().clone();
        if let Some(active_id) = active {
            if let Some(backend) = self
                .backends
                .iter()
                .find(|b| b.available && b.model.id() == active_id)
            {
                return Some(Arc::clone(&backend.model));
            }
        }
        self.backends
            .iter()
            .find(|b| b.available)
            .map(|b| Arc::clone(&b.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedModel {
        id: String,
        reply: String,
    }

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Ok(self.reply.clone())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn id(&self) -> &str {
            &self.id
        }

        fn label(&self) -> &str {
            &self.id
        }

        fn provider(&self) -> &str {
            "fake"
        }
    }

    fn canned(id: &str, reply: &str) -> Arc<dyn ChatModel> {
        Arc::new(CannedModel {
            id: id.to_string(),
            reply: reply.to_string(),
        })
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: String::new(),
            history: Vec::new(),
            user: "hi".to_string(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn prefers_first_available_backend() {
        let gateway = LlmGateway::from_backends(
            vec![
                (canned("local", "from-local"), false),
                (canned("hosted-a", "from-a"), true),
                (canned("hosted-b", "from-b"), true),
            ],
            "local",
        );

        assert_eq!(gateway.current_model().as_deref(), Some("hosted-a"));
        assert_eq!(gateway.complete(&request()).await.unwrap(), "from-a");
    }

    #[tokio::test]
    async fn set_active_switches_backends() {
        let gateway = LlmGateway::from_backends(
            vec![
                (canned("hosted-a", "from-a"), true),
                (canned("hosted-b", "from-b"), true),
            ],
            "hosted-a",
        );

        gateway.set_active("hosted-b").unwrap();
        assert_eq!(gateway.complete(&request()).await.unwrap(), "from-b");
        assert!(gateway.set_active("missing").is_err());
    }

    #[tokio::test]
    async fn degrades_when_nothing_is_available() {
        let gateway = LlmGateway::from_backends(vec![(canned("local", "x"), false)], "local");
        assert!(!gateway.has_backend());
        assert!(matches!(
            gateway.complete(&request()).await,
            Err(Error::LlmUnavailable)
        ));
    }
}
