//! Shared application state

use std::sync::Arc;
use uuid::Uuid;

use crate::chat::{ChatRouter, ConversationStore};
use crate::config::RagConfig;
use crate::embedding::{EmbedderGateway, OllamaEmbedder};
use crate::error::Result;
use crate::ingestion::{extractor, TextChunker, UrlFetcher};
use crate::llm::LlmGateway;
use crate::retrieval::HybridIndex;

/// Shared application state, cheap to clone
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    index: Arc<HybridIndex>,
    llm: Arc<LlmGateway>,
    router: ChatRouter,
    conversations: ConversationStore,
    fetcher: UrlFetcher,
    chunker: TextChunker,
}

impl AppState {
    /// Construct state with the production backends
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("initializing application state");

        let provider = Arc::new(OllamaEmbedder::new(&config));
        let embedder = Arc::new(EmbedderGateway::new(
            provider,
            config.embedding.batch_size,
            config.embedding.max_input_chars,
        ));
        let index = Arc::new(HybridIndex::new(embedder));

        let llm = Arc::new(LlmGateway::new(&config.llm).await);
        tracing::info!(
            "LLM gateway ready ({} models, backend available: {})",
            llm.available_models().len(),
            llm.has_backend()
        );

        Ok(Self::with_parts(config, index, llm))
    }

    /// Assemble state from prepared components. Tests use this to inject
    /// deterministic embedder and LLM fakes.
    pub fn with_parts(config: RagConfig, index: Arc<HybridIndex>, llm: Arc<LlmGateway>) -> Self {
        let router = ChatRouter::new(Arc::clone(&index), Arc::clone(&llm), config.router.clone());
        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                index,
                llm,
                router,
                conversations: ConversationStore::new(),
                fetcher: UrlFetcher::new(),
                chunker,
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn index(&self) -> &Arc<HybridIndex> {
        &self.inner.index
    }

    pub fn llm(&self) -> &Arc<LlmGateway> {
        &self.inner.llm
    }

    pub fn router(&self) -> &ChatRouter {
        &self.inner.router
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.inner.conversations
    }

    /// Extract, chunk, embed and index one uploaded file.
    /// Returns the new document id and its chunk count.
    pub async fn ingest_file(&self, name: &str, data: &[u8]) -> Result<(Uuid, usize)> {
        let extraction = extractor::extract(name, data)?;
        self.ingest_extraction(extraction).await
    }

    /// Fetch, chunk, embed and index a web page
    pub async fn ingest_url(&self, url: &str) -> Result<(Uuid, usize)> {
        let extraction = self.inner.fetcher.fetch(url).await?;
        self.ingest_extraction(extraction).await
    }

    async fn ingest_extraction(&self, extraction: extractor::Extraction) -> Result<(Uuid, usize)> {
        let drafts = self.inner.chunker.chunk(&extraction.text, &extraction.info);
        let doc_id = Uuid::new_v4();
        let count = self
            .inner
            .index
            .add(doc_id, &extraction.info.source, drafts)
            .await?;
        Ok((doc_id, count))
    }
}
