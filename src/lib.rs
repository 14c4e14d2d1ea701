//! corpus-rag: retrieval-augmented chat over uploaded documents
//!
//! Documents (PDF, DOCX, XLSX, PPTX, TXT, MD, CSV) and web URLs are parsed,
//! split into overlapping chunks, embedded, and indexed alongside sparse
//! keyword signatures. Chat queries are served in three modes: grounded
//! (answer only from indexed chunks, with citations), open (answer from the
//! model's general knowledge), or auto (route per query).

pub mod chat;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod llm;
pub mod retrieval;
pub mod server;
pub mod types;
mod util;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{AnswerMode, ChatMode, Chunk, ChunkDraft, Document, ScoredChunk};
