//! End-to-end ingest -> index -> route tests with deterministic in-process
//! fakes for the embedder and the LLM.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use corpus_rag::chat::prompt::{DEGRADED_GROUNDED_SUFFIX, EMPTY_CORPUS_REFUSAL};
use corpus_rag::chat::ChatRouter;
use corpus_rag::config::RagConfig;
use corpus_rag::embedding::{EmbedderGateway, EmbeddingProvider};
use corpus_rag::error::Result;
use corpus_rag::llm::{ChatModel, CompletionRequest, LlmGateway};
use corpus_rag::retrieval::HybridIndex;
use corpus_rag::server::state::AppState;
use corpus_rag::types::{AnswerMode, ChatMode, ChunkDraft, ChunkMetadata, SourceKind};

const DIMS: usize = 256;

/// Deterministic, collision-free bag-of-words embedder: every distinct
/// token gets its own dimension, assigned in order of first appearance.
struct VocabEmbedder {
    vocabulary: Mutex<HashMap<String, usize>>,
}

impl VocabEmbedder {
    fn new() -> Self {
        Self {
            vocabulary: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for VocabEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIMS];
        let mut vocabulary = self.vocabulary.lock();
        for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let next = vocabulary.len() % DIMS;
            let index = *vocabulary.entry(token.to_string()).or_insert(next);
            vector[index] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "vocab-fake"
    }
}

/// LLM fake that counts completions and echoes the user query
struct CountingLlm {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ChatModel for CountingLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("answer to: {}", request.user))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn id(&self) -> &str {
        "fake-model"
    }

    fn label(&self) -> &str {
        "Fake Model"
    }

    fn provider(&self) -> &str {
        "fake"
    }
}

/// Full stack over fakes. Returns the state and the LLM call counter.
fn test_state(llm_available: bool) -> (AppState, Arc<AtomicUsize>) {
    let mut config = RagConfig::default();
    config.embedding.dimensions = DIMS;

    let embedder = Arc::new(EmbedderGateway::new(
        Arc::new(VocabEmbedder::new()),
        config.embedding.batch_size,
        config.embedding.max_input_chars,
    ));
    let index = Arc::new(HybridIndex::new(embedder));

    let calls = Arc::new(AtomicUsize::new(0));
    let llm = Arc::new(LlmGateway::from_backends(
        vec![(
            Arc::new(CountingLlm {
                calls: Arc::clone(&calls),
            }) as Arc<dyn ChatModel>,
            llm_available,
        )],
        "fake-model",
    ));

    (AppState::with_parts(config, index, llm), calls)
}

fn draft(source: &str, index: usize, content: &str) -> ChunkDraft {
    ChunkDraft {
        content: content.to_string(),
        metadata: ChunkMetadata {
            source: source.to_string(),
            kind: SourceKind::Text,
            chunk_index: index,
            char_start: index * 600,
            char_end: index * 600 + content.len(),
            title: None,
        },
    }
}

#[tokio::test]
async fn empty_corpus_auto_resolves_to_general() {
    let (state, _calls) = test_state(true);

    let outcome = state
        .router()
        .route("Hello", ChatMode::Auto, &[])
        .await
        .unwrap();

    assert_eq!(outcome.mode, AnswerMode::General);
    assert!(outcome.sources.is_empty());
    assert!(outcome.retrieved_count.is_none());
}

#[tokio::test]
async fn hint_terms_route_auto_to_grounded() {
    let (state, _calls) = test_state(true);
    state
        .ingest_file("cats.txt", b"Cats purr when content.")
        .await
        .unwrap();

    let outcome = state
        .router()
        .route(
            "What does the document say about cats?",
            ChatMode::Auto,
            &[],
        )
        .await
        .unwrap();

    assert_eq!(outcome.mode, AnswerMode::Rag);
    assert_eq!(outcome.sources[0].source, "cats.txt");
    assert!(outcome.retrieved_count.unwrap() >= 1);
    assert!(!outcome.no_relevant_results);
}

#[tokio::test]
async fn unrelated_query_without_hints_stays_general() {
    let (state, _calls) = test_state(true);
    state
        .ingest_file("policy.txt", b"The reimbursement limit is 500 dollars per quarter.")
        .await
        .unwrap();

    let outcome = state
        .router()
        .route("banana", ChatMode::Auto, &[])
        .await
        .unwrap();

    assert_eq!(outcome.mode, AnswerMode::General);
    assert!(outcome.sources.is_empty());
}

#[tokio::test]
async fn grounded_mode_reports_no_relevant_results() {
    let (state, calls) = test_state(true);
    state
        .ingest_file("policy.txt", b"The reimbursement limit is 500 dollars per quarter.")
        .await
        .unwrap();

    let outcome = state
        .router()
        .route("banana", ChatMode::Rag, &[])
        .await
        .unwrap();

    assert_eq!(outcome.mode, AnswerMode::Rag);
    assert!(outcome.no_relevant_results);
    assert!(outcome.sources.is_empty());
    // No fabricated answer: the LLM was never consulted
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn grounded_mode_refuses_on_empty_corpus_without_llm_call() {
    let (state, calls) = test_state(true);

    let outcome = state
        .router()
        .route("summarize", ChatMode::Rag, &[])
        .await
        .unwrap();

    assert_eq!(outcome.mode, AnswerMode::Error);
    assert_eq!(outcome.answer, EMPTY_CORPUS_REFUSAL);
    assert!(outcome.sources.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn deleting_a_document_isolates_its_content() {
    let (state, _calls) = test_state(true);
    let (doc_a, _) = state
        .ingest_file("alpha.txt", b"Kumquat marmalade recipe with ginger.")
        .await
        .unwrap();
    state
        .ingest_file("beta.txt", b"Quantum entanglement basics for beginners.")
        .await
        .unwrap();

    state.index().remove(&doc_a).unwrap();

    let hits = state.index().hybrid_search("kumquat", 8).await.unwrap();
    assert!(hits.iter().all(|h| h.doc_id != doc_a));
    assert!(hits.iter().all(|h| !h.content.to_lowercase().contains("kumquat")));

    let hits = state.index().hybrid_search("quantum", 8).await.unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0].metadata.source, "beta.txt");
    assert!(hits[0].score > 0.0);
}

#[tokio::test]
async fn chunks_with_the_keyword_outrank_chunks_without_it() {
    let (state, _calls) = test_state(true);
    let doc_id = Uuid::new_v4();
    state
        .index()
        .add(
            doc_id,
            "doc.txt",
            vec![
                draft("doc.txt", 0, "Kumquat tart with kumquat glaze."),
                draft("doc.txt", 1, "Plain oatmeal breakfast notes."),
            ],
        )
        .await
        .unwrap();

    let hits = state.index().hybrid_search("kumquat dessert", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "doc.txt-chunk-0");
    assert!(hits[0].score > hits[1].score);
}

#[tokio::test]
async fn add_remove_and_clear_keep_counts_consistent() {
    let (state, _calls) = test_state(true);
    assert_eq!(state.index().count_documents(), 0);
    assert_eq!(state.index().count_chunks(), 0);

    let (doc_id, chunks) = state
        .ingest_file("notes.txt", b"One sentence here. Another sentence there.")
        .await
        .unwrap();
    assert!(chunks >= 1);
    assert_eq!(state.index().count_documents(), 1);
    assert_eq!(state.index().count_chunks(), chunks);
    assert!(state.index().has_documents());

    let removed = state.index().remove(&doc_id).unwrap();
    assert_eq!(removed, chunks);
    assert_eq!(state.index().count_documents(), 0);
    assert_eq!(state.index().count_chunks(), 0);

    // clear is idempotent
    state.index().clear();
    state.index().clear();
    assert_eq!(state.index().count_documents(), 0);
    assert!(!state.index().has_documents());
}

#[tokio::test]
async fn search_results_are_deterministic_and_bounded() {
    let (state, _calls) = test_state(true);
    for i in 0..3 {
        state
            .ingest_file(
                &format!("doc{}.txt", i),
                format!("Shared subject matter plus detail number {}.", i).as_bytes(),
            )
            .await
            .unwrap();
    }

    let first = state.index().hybrid_search("shared subject", 2).await.unwrap();
    let second = state.index().hybrid_search("shared subject", 2).await.unwrap();

    assert_eq!(first.len(), 2);
    assert!(first.len() <= state.index().count_chunks());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.score, b.score);
    }

    // component ranges
    for hit in &first {
        assert!(hit.keyword_score >= 0.0 && hit.keyword_score <= 1.0);
        assert!(hit.phrase_boost >= 0.0 && hit.phrase_boost <= 0.15 + 1e-6);
        assert!(hit.score >= -0.45 && hit.score <= 0.85 + 1e-6);
    }
}

#[tokio::test]
async fn indexed_chunks_satisfy_embedding_and_keyword_invariants() {
    let (state, _calls) = test_state(true);
    let text = (0..80)
        .map(|i| format!("Sentence number {} talks about indexing pipelines and retrieval.", i))
        .collect::<Vec<_>>()
        .join(" ");
    let (_, chunks) = state.ingest_file("long.txt", text.as_bytes()).await.unwrap();
    assert!(chunks > 1);

    let hits = state
        .index()
        .hybrid_search("indexing pipelines", chunks)
        .await
        .unwrap();
    assert_eq!(hits.len(), chunks);

    // chunk ids are dense and derived from the source name
    let mut indexes: Vec<usize> = hits.iter().map(|h| h.metadata.chunk_index).collect();
    indexes.sort_unstable();
    assert_eq!(indexes, (0..chunks).collect::<Vec<_>>());
    for hit in &hits {
        assert_eq!(hit.id, format!("long.txt-chunk-{}", hit.metadata.chunk_index));
    }
}

#[tokio::test]
async fn degraded_grounded_mode_returns_raw_context() {
    let (state, calls) = test_state(false);
    state
        .ingest_file("cats.txt", b"Cats purr when content.")
        .await
        .unwrap();

    let outcome = state
        .router()
        .route("What does the document say about cats?", ChatMode::Rag, &[])
        .await
        .unwrap();

    assert_eq!(outcome.mode, AnswerMode::Rag);
    assert!(outcome.answer.contains("[Source 1 - cats.txt]"));
    assert!(outcome.answer.contains("Cats purr when content."));
    assert!(outcome.answer.ends_with(DEGRADED_GROUNDED_SUFFIX));
    assert!(!outcome.sources.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn degraded_open_mode_echoes_the_query() {
    let (state, calls) = test_state(false);

    let outcome = state
        .router()
        .route("Hello there", ChatMode::General, &[])
        .await
        .unwrap();

    assert_eq!(outcome.mode, AnswerMode::General);
    assert!(outcome.answer.contains("Hello there"));
    assert!(outcome.answer.contains("No language model is configured"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn grounded_answers_come_from_the_llm_when_available() {
    let (state, calls) = test_state(true);
    state
        .ingest_file("cats.txt", b"Cats purr when content.")
        .await
        .unwrap();

    let outcome = state
        .router()
        .route("What does the document say about cats?", ChatMode::Rag, &[])
        .await
        .unwrap();

    assert_eq!(outcome.answer, "answer to: What does the document say about cats?");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(outcome.sources[0].score.ends_with('%'));
}

#[tokio::test]
async fn vector_search_ranks_by_cosine_alone() {
    let (state, _calls) = test_state(true);
    let doc_id = Uuid::new_v4();
    state
        .index()
        .add(
            doc_id,
            "doc.txt",
            vec![
                draft("doc.txt", 0, "saffron saffron saffron"),
                draft("doc.txt", 1, "saffron cardamom cinnamon nutmeg clove"),
            ],
        )
        .await
        .unwrap();

    let hits = state.index().vector_search("saffron", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    // the purer chunk has the higher cosine
    assert_eq!(hits[0].metadata.chunk_index, 0);
    assert!(hits[0].vector_score > hits[1].vector_score);
    assert_eq!(hits[0].score, hits[0].vector_score);
    assert!(hits[0].vector_score <= 1.0 + 1e-4);
    assert_eq!(hits[0].keyword_score, 0.0);
    assert_eq!(hits[0].phrase_boost, 0.0);
}

#[tokio::test]
async fn chunk_ids_are_unique_across_documents() {
    let (state, _calls) = test_state(true);
    state.ingest_file("a.txt", b"First corpus entry.").await.unwrap();
    state.ingest_file("b.txt", b"Second corpus entry.").await.unwrap();

    let hits = state.index().hybrid_search("corpus entry", 8).await.unwrap();
    let mut ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), hits.len());
}

#[tokio::test]
async fn list_documents_preserves_insertion_order() {
    let (state, _calls) = test_state(true);
    state.ingest_file("one.txt", b"First.").await.unwrap();
    state.ingest_file("two.txt", b"Second.").await.unwrap();
    state.ingest_file("three.txt", b"Third.").await.unwrap();

    let names: Vec<String> = state
        .index()
        .list_documents()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["one.txt", "two.txt", "three.txt"]);
}

#[tokio::test]
async fn router_is_usable_standalone() {
    // The router only needs the index and the gateway, not the full state
    let embedder = Arc::new(EmbedderGateway::new(Arc::new(VocabEmbedder::new()), 4, 512));
    let index = Arc::new(HybridIndex::new(embedder));
    let calls = Arc::new(AtomicUsize::new(0));
    let llm = Arc::new(LlmGateway::from_backends(
        vec![(
            Arc::new(CountingLlm {
                calls: Arc::clone(&calls),
            }) as Arc<dyn ChatModel>,
            true,
        )],
        "fake-model",
    ));
    let router = ChatRouter::new(index, llm, RagConfig::default().router);

    let outcome = router.route("Hi", ChatMode::Auto, &[]).await.unwrap();
    assert_eq!(outcome.mode, AnswerMode::General);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
