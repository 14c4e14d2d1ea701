//! Mode resolution, retrieval thresholds and answer assembly
//!
//! The router decides per turn whether a query is answered from the indexed
//! corpus (grounded) or from the model's general knowledge (open), applies
//! the two-level relevance threshold with a fallback pass, and degrades to
//! canned answers when no LLM backend is configured.

use std::sync::Arc;

use crate::config::RouterConfig;
use crate::error::{Error, Result};
use crate::llm::{CompletionRequest, LlmGateway};
use crate::retrieval::HybridIndex;
use crate::types::{AnswerMode, ChatMode, ChatOutcome, Message, ScoredChunk};

use super::prompt::{
    build_context, build_source_refs, degraded_open_answer, grounded_system,
    DEGRADED_GROUNDED_SUFFIX, EMPTY_CORPUS_REFUSAL, NO_RELEVANT_RESULTS, OPEN_SYSTEM_PROMPT,
};

/// Sampling temperature for grounded answers
pub const GROUNDED_TEMPERATURE: f32 = 0.3;
/// Sampling temperature for open answers
pub const OPEN_TEMPERATURE: f32 = 0.7;

/// Routes chat turns between grounded and open handling
pub struct ChatRouter {
    index: Arc<HybridIndex>,
    llm: Arc<LlmGateway>,
    config: RouterConfig,
}

impl ChatRouter {
    pub fn new(index: Arc<HybridIndex>, llm: Arc<LlmGateway>, config: RouterConfig) -> Self {
        Self { index, llm, config }
    }

    /// Resolve the mode for a query and produce the answer
    pub async fn route(
        &self,
        query: &str,
        requested: ChatMode,
        history: &[Message],
    ) -> Result<ChatOutcome> {
        match requested {
            ChatMode::Rag if !self.index.has_documents() => {
                // Refuse without calling the LLM
                tracing::info!("grounded mode requested against an empty corpus");
                Ok(ChatOutcome {
                    answer: EMPTY_CORPUS_REFUSAL.to_string(),
                    mode: AnswerMode::Error,
                    sources: Vec::new(),
                    retrieved_count: None,
                    no_relevant_results: false,
                })
            }
            ChatMode::Rag => self.grounded(query, history).await,
            ChatMode::General => self.open(query, history).await,
            ChatMode::Auto => {
                let resolved = self.resolve_auto(query).await?;
                tracing::info!("auto mode resolved to {:?}", resolved);
                match resolved {
                    AnswerMode::Rag => self.grounded(query, history).await,
                    _ => self.open(query, history).await,
                }
            }
        }
    }

    /// Auto policy: empty corpus goes open; a hint term forces grounded;
    /// otherwise a one-result probe decides by the relevance threshold.
    async fn resolve_auto(&self, query: &str) -> Result<AnswerMode> {
        if !self.index.has_documents() {
            return Ok(AnswerMode::General);
        }
        if self.matches_hint(query) {
            return Ok(AnswerMode::Rag);
        }

        let probe = self.index.hybrid_search(query, 1).await?;
        let relevant = probe
            .first()
            .map_or(false, |top| top.score > self.config.relevance_threshold);
        Ok(if relevant {
            AnswerMode::Rag
        } else {
            AnswerMode::General
        })
    }

    fn matches_hint(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.config
            .doc_keyword_hints
            .iter()
            .any(|hint| query.contains(hint.as_str()))
    }

    async fn grounded(&self, query: &str, history: &[Message]) -> Result<ChatOutcome> {
        let hits = self
            .index
            .hybrid_search(query, self.config.retrieval_k)
            .await?;

        let relevant: Vec<ScoredChunk> = hits
            .iter()
            .filter(|h| h.score >= self.config.relevance_threshold)
            .cloned()
            .collect();

        let used = if relevant.is_empty() {
            let fallback: Vec<ScoredChunk> = hits
                .iter()
                .filter(|h| h.score >= self.config.fallback_threshold)
                .take(self.config.fallback_k)
                .cloned()
                .collect();

            if fallback.is_empty() {
                return Ok(ChatOutcome {
                    answer: NO_RELEVANT_RESULTS.to_string(),
                    mode: AnswerMode::Rag,
                    sources: Vec::new(),
                    retrieved_count: Some(0),
                    no_relevant_results: true,
                });
            }

            tracing::debug!(
                "primary threshold yielded nothing, using {} fallback chunks",
                fallback.len()
            );
            fallback
        } else {
            relevant
        };

        let context = build_context(&used);
        let sources = build_source_refs(&used);

        let request = CompletionRequest {
            system: grounded_system(&context),
            history: self.window(history),
            user: query.to_string(),
            temperature: GROUNDED_TEMPERATURE,
            max_tokens: None,
        };

        let answer = match self.llm.complete(&request).await {
            Ok(answer) => answer,
            Err(Error::LlmUnavailable) => format!("{}{}", context, DEGRADED_GROUNDED_SUFFIX),
            Err(e) => return Err(e),
        };

        Ok(ChatOutcome {
            answer,
            mode: AnswerMode::Rag,
            sources,
            retrieved_count: Some(used.len()),
            no_relevant_results: false,
        })
    }

    async fn open(&self, query: &str, history: &[Message]) -> Result<ChatOutcome> {
        let request = CompletionRequest {
            system: OPEN_SYSTEM_PROMPT.to_string(),
            history: self.window(history),
            user: query.to_string(),
            temperature: OPEN_TEMPERATURE,
            max_tokens: None,
        };

        let answer = match self.llm.complete(&request).await {
            Ok(answer) => answer,
            Err(Error::LlmUnavailable) => degraded_open_answer(query),
            Err(e) => return Err(e),
        };

        Ok(ChatOutcome {
            answer,
            mode: AnswerMode::General,
            sources: Vec::new(),
            retrieved_count: None,
            no_relevant_results: false,
        })
    }

    fn window(&self, history: &[Message]) -> Vec<Message> {
        let tail = history.len().saturating_sub(self.config.history_window);
        history[tail..].to_vec()
    }
}
