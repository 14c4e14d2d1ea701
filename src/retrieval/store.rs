//! Hybrid dense + sparse index over document chunks
//!
//! Scoring combines cosine similarity on normalized embeddings, keyword-bag
//! overlap, and a small phrase-presence boost. Writers are exclusive;
//! searches share a read lock and never observe a half-ingested document:
//! embeddings are computed before the write lock is taken and a document's
//! chunks are published in one critical section.

use chrono::Utc;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

use crate::embedding::EmbedderGateway;
use crate::error::{Error, Result};
use crate::ingestion::extract_keywords;
use crate::types::{Chunk, ChunkDraft, Document, ScoredChunk};

use super::registry::DocumentRegistry;

/// Weight of the dense similarity in the combined score
pub const VECTOR_WEIGHT: f32 = 0.60;
/// Weight of the keyword overlap in the combined score
pub const KEYWORD_WEIGHT: f32 = 0.25;
/// Boost per important query word present in the chunk content
pub const WORD_BOOST: f32 = 0.05;
/// Additional boost when the leading two-word phrase is present
pub const PHRASE_BOOST: f32 = 0.10;
/// Ceiling for the total phrase boost
pub const MAX_PHRASE_BOOST: f32 = 0.15;
/// Default number of results returned by searches
pub const DEFAULT_TOP_K: usize = 8;

/// How many leading query keywords count as "important words"
const IMPORTANT_WORDS: usize = 5;

struct IndexState {
    chunks: Vec<Chunk>,
    registry: DocumentRegistry,
}

/// In-memory hybrid index plus the document registry it stays in lock-step with
pub struct HybridIndex {
    embedder: Arc<EmbedderGateway>,
    state: RwLock<IndexState>,
}

impl HybridIndex {
    pub fn new(embedder: Arc<EmbedderGateway>) -> Self {
        Self {
            embedder,
            state: RwLock::new(IndexState {
                chunks: Vec::new(),
                registry: DocumentRegistry::new(),
            }),
        }
    }

    /// Embed and index a document's chunks, registering the document.
    ///
    /// All embedding happens before the write lock is taken; readers see
    /// either none or all of the document's chunks. Returns the chunk count.
    pub async fn add(&self, doc_id: Uuid, name: &str, drafts: Vec<ChunkDraft>) -> Result<usize> {
        let texts: Vec<String> = drafts.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.embedder.embed_many(&texts).await?;

        let mut staged = Vec::with_capacity(drafts.len());
        for (draft, embedding) in drafts.into_iter().zip(embeddings) {
            let keywords = extract_keywords(&draft.content);
            staged.push(Chunk {
                id: format!("{}-chunk-{}", name, draft.metadata.chunk_index),
                doc_id,
                content: draft.content,
                metadata: draft.metadata,
                embedding,
                keywords,
            });
        }

        let chunk_count = staged.len();
        let mut state = self.state.write();
        state.registry.insert(Document {
            id: doc_id,
            name: name.to_string(),
            chunk_count,
            added_at: Utc::now(),
        });
        state.chunks.extend(staged);

        tracing::info!("indexed '{}': {} chunks", name, chunk_count);
        Ok(chunk_count)
    }

    /// Remove a document and every chunk it owns, atomically
    pub fn remove(&self, doc_id: &Uuid) -> Result<usize> {
        let mut state = self.state.write();
        let document = state
            .registry
            .remove(doc_id)
            .ok_or_else(|| Error::DocumentNotFound(doc_id.to_string()))?;

        let before = state.chunks.len();
        state.chunks.retain(|c| c.doc_id != *doc_id);
        let removed = before - state.chunks.len();

        tracing::info!("removed '{}': {} chunks evicted", document.name, removed);
        Ok(removed)
    }

    /// Empty the index and the registry. Idempotent.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.chunks.clear();
        state.registry.clear();
    }

    /// Top-k chunks by dense similarity alone
    pub async fn vector_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed_one(query).await?;

        let state = self.state.read();
        let mut scored: Vec<ScoredChunk> = state
            .chunks
            .iter()
            .map(|chunk| {
                let vector_score = dot(&query_embedding, &chunk.embedding);
                ScoredChunk {
                    id: chunk.id.clone(),
                    doc_id: chunk.doc_id,
                    content: chunk.content.clone(),
                    metadata: chunk.metadata.clone(),
                    vector_score,
                    keyword_score: 0.0,
                    phrase_boost: 0.0,
                    score: vector_score,
                }
            })
            .collect();

        sort_descending(&mut scored);
        scored.truncate(k);
        Ok(scored)
    }

    /// Top-k chunks by the combined dense + sparse + phrase score.
    ///
    /// Deterministic for a fixed index and query: the sort is stable, so
    /// ties keep insertion order.
    pub async fn hybrid_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed_one(query).await?;
        let query_keywords = extract_keywords(query);

        let state = self.state.read();
        let mut scored: Vec<ScoredChunk> = state
            .chunks
            .iter()
            .map(|chunk| score_chunk(chunk, &query_embedding, &query_keywords))
            .collect();

        sort_descending(&mut scored);
        scored.truncate(k);
        Ok(scored)
    }

    pub fn count_documents(&self) -> usize {
        self.state.read().registry.len()
    }

    pub fn count_chunks(&self) -> usize {
        self.state.read().chunks.len()
    }

    pub fn has_documents(&self) -> bool {
        !self.state.read().registry.is_empty()
    }

    /// Registered documents in insertion order
    pub fn list_documents(&self) -> Vec<Document> {
        self.state.read().registry.iter().cloned().collect()
    }

    pub fn get_document(&self, id: &Uuid) -> Option<Document> {
        self.state.read().registry.get(id).cloned()
    }
}

/// Score one chunk against the query signals
fn score_chunk(chunk: &Chunk, query_embedding: &[f32], query_keywords: &[String]) -> ScoredChunk {
    let vector_score = dot(query_embedding, &chunk.embedding);

    let overlap = query_keywords
        .iter()
        .filter(|kw| chunk.keywords.contains(kw))
        .count();
    let keyword_score = overlap as f32 / query_keywords.len().max(1) as f32;

    let phrase_boost = phrase_boost(&chunk.content, query_keywords);

    ScoredChunk {
        id: chunk.id.clone(),
        doc_id: chunk.doc_id,
        content: chunk.content.clone(),
        metadata: chunk.metadata.clone(),
        vector_score,
        keyword_score,
        phrase_boost,
        score: VECTOR_WEIGHT * vector_score + KEYWORD_WEIGHT * keyword_score + phrase_boost,
    }
}

/// Phrase boost against the lowercased content: +0.05 per present important
/// word, +0.10 when the leading two-word phrase appears, clamped to 0.15.
fn phrase_boost(content: &str, query_keywords: &[String]) -> f32 {
    let important = &query_keywords[..query_keywords.len().min(IMPORTANT_WORDS)];
    if important.is_empty() {
        return 0.0;
    }

    let content = content.to_lowercase();
    let mut boost = important
        .iter()
        .filter(|word| content.contains(word.as_str()))
        .count() as f32
        * WORD_BOOST;

    if important.len() >= 2 {
        let phrase = format!("{} {}", important[0], important[1]);
        if content.contains(&phrase) {
            boost += PHRASE_BOOST;
        }
    }

    boost.min(MAX_PHRASE_BOOST)
}

/// Both sides are unit-normalized, so the dot product is the cosine
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Stable descending sort; ties keep insertion order
fn sort_descending(scored: &mut [ScoredChunk]) {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkMetadata, SourceKind};

    fn chunk(id: &str, content: &str, embedding: Vec<f32>, keywords: &[&str]) -> Chunk {
        Chunk {
            id: id.to_string(),
            doc_id: Uuid::new_v4(),
            content: content.to_string(),
            metadata: ChunkMetadata {
                source: "test.txt".to_string(),
                kind: SourceKind::Text,
                chunk_index: 0,
                char_start: 0,
                char_end: content.len(),
                title: None,
            },
            embedding,
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keyword_score_is_overlap_over_query_size() {
        let c = chunk("c", "", vec![1.0], &["alpha", "beta", "gamma"]);
        let scored = score_chunk(&c, &[0.0], &kw(&["alpha", "beta", "delta", "epsilon"]));
        assert!((scored.keyword_score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_query_keywords_do_not_divide_by_zero() {
        let c = chunk("c", "anything", vec![1.0], &["alpha"]);
        let scored = score_chunk(&c, &[1.0], &kw(&[]));
        assert_eq!(scored.keyword_score, 0.0);
        assert_eq!(scored.phrase_boost, 0.0);
    }

    #[test]
    fn phrase_boost_counts_words_and_leading_phrase() {
        // both important words present plus the two-word phrase: clamped to 0.15
        let boost = phrase_boost("the quick brown fox", &kw(&["quick", "brown"]));
        assert!((boost - MAX_PHRASE_BOOST).abs() < 1e-6);

        // one word present, no phrase
        let boost = phrase_boost("only quick here", &kw(&["quick", "brown"]));
        assert!((boost - WORD_BOOST).abs() < 1e-6);

        // words present separately but not adjacent: 2 * 0.05
        let boost = phrase_boost("quick red brown", &kw(&["quick", "brown"]));
        assert!((boost - 2.0 * WORD_BOOST).abs() < 1e-6);
    }

    #[test]
    fn phrase_boost_never_exceeds_ceiling() {
        let content = "alpha beta gamma delta epsilon";
        let boost = phrase_boost(content, &kw(&["alpha", "beta", "gamma", "delta", "epsilon"]));
        assert!((boost - MAX_PHRASE_BOOST).abs() < 1e-6);
    }

    #[test]
    fn combined_score_uses_the_documented_weights() {
        let c = chunk("c", "zebra", vec![1.0, 0.0], &["zebra"]);
        let scored = score_chunk(&c, &[1.0, 0.0], &kw(&["zebra"]));
        // cosine 1.0, keyword 1.0, boost 0.05 (single word, no phrase)
        let expected = VECTOR_WEIGHT + KEYWORD_WEIGHT + WORD_BOOST;
        assert!((scored.score - expected).abs() < 1e-6);
    }

    #[test]
    fn stable_sort_keeps_insertion_order_on_ties() {
        let mut scored: Vec<ScoredChunk> = (0..4)
            .map(|i| {
                let c = chunk(&format!("c{}", i), "", vec![0.0], &[]);
                score_chunk(&c, &[0.0], &kw(&[]))
            })
            .collect();
        sort_descending(&mut scored);
        let ids: Vec<&str> = scored.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c2", "c3"]);
    }
}
