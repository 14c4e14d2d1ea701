//! Core types for the RAG chat service

pub mod chat;
pub mod document;

pub use chat::{AnswerMode, ChatMode, ChatOutcome, Message, Role, SourceRef};
pub use document::{Chunk, ChunkDraft, ChunkMetadata, Document, ScoredChunk, SourceInfo, SourceKind};
