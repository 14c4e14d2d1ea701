//! Document and chunk types shared across ingestion, indexing and chat

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Broad category of an ingested source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Microsoft PowerPoint presentation (.pptx)
    Pptx,
    /// Excel spreadsheet (.xlsx, .xls)
    Spreadsheet,
    /// Plain text file
    Text,
    /// Markdown file
    Markdown,
    /// CSV file
    Csv,
    /// Fetched web page
    Webpage,
}

impl SourceKind {
    /// Detect source kind from a lowercased file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "xlsx" | "xls" => Some(Self::Spreadsheet),
            "txt" => Some(Self::Text),
            "md" | "markdown" => Some(Self::Markdown),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

}

/// Identity of an extracted source, stamped onto every chunk it produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Filename or URL as presented by the client
    pub source: String,
    /// Source category
    pub kind: SourceKind,
    /// Page title for web pages, absent for files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SourceInfo {
    /// Source info for an uploaded file
    pub fn file(name: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            source: name.into(),
            kind,
            title: None,
        }
    }
}

/// Per-chunk metadata carried through indexing and into citations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Filename or URL of the owning source
    pub source: String,
    /// Source category
    pub kind: SourceKind,
    /// Position of the chunk within its document (0, 1, 2, ...)
    pub chunk_index: usize,
    /// Approximate character offset of the chunk start.
    /// Advisory only: computed from the chunking stride, not the true offset.
    pub char_start: usize,
    /// Approximate character offset of the chunk end (advisory)
    pub char_end: usize,
    /// Page title for web sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A chunk produced by the chunker, before embedding and keyword extraction
#[derive(Debug, Clone)]
pub struct ChunkDraft {
    /// Trimmed chunk text
    pub content: String,
    /// Metadata stamp
    pub metadata: ChunkMetadata,
}

/// The unit of retrieval: a bounded excerpt with its dense and sparse signals
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Unique id, derived as `<source-name>-chunk-<index>`
    pub id: String,
    /// Owning document
    pub doc_id: Uuid,
    /// Chunk text
    pub content: String,
    /// Metadata stamp
    pub metadata: ChunkMetadata,
    /// L2-normalized dense vector of the configured dimension
    pub embedding: Vec<f32>,
    /// Up to 20 distinct lowercase tokens, highest-frequency first
    pub keywords: Vec<String>,
}

/// Registry entry for an ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document id, generated at ingest
    pub id: Uuid,
    /// Filename or URL as presented by the client
    pub name: String,
    /// Number of chunks produced at ingest
    pub chunk_count: usize,
    /// Ingestion timestamp
    pub added_at: DateTime<Utc>,
}

/// A chunk scored against a query by the hybrid ranker
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub id: String,
    pub doc_id: Uuid,
    pub content: String,
    pub metadata: ChunkMetadata,
    /// Cosine similarity between query and chunk embeddings, in [-1, 1]
    pub vector_score: f32,
    /// Keyword-bag overlap ratio, in [0, 1]
    pub keyword_score: f32,
    /// Phrase-presence boost, in [0, 0.15]
    pub phrase_boost: f32,
    /// Combined score: 0.60 * vector + 0.25 * keyword + boost
    pub score: f32,
}
