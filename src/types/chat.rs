//! Chat modes, conversation messages and citation references

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mode requested by the client for a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Route per query: grounded when the corpus looks relevant, open otherwise
    Auto,
    /// Answer only from indexed chunks, with citations
    Rag,
    /// Answer from the model's general knowledge
    General,
}

impl ChatMode {
    /// Parse one of the three wire strings, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "rag" => Some(Self::Rag),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

/// Mode actually used to produce an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    Rag,
    General,
    /// The request could not be served as asked (e.g. grounded mode with an
    /// empty corpus); the answer explains why
    Error,
}

/// Role of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Mode the assistant answered in, absent on user messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<AnswerMode>,
    /// Citations attached to an assistant message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceRef>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            mode: None,
            sources: None,
        }
    }

    pub fn assistant(content: impl Into<String>, mode: AnswerMode, sources: Vec<SourceRef>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            mode: Some(mode),
            sources: Some(sources),
        }
    }
}

/// Citation shown to the client for one retrieved chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    /// 1-based rank of the source in the answer context
    pub id: usize,
    /// Preview of the chunk content (truncated)
    pub content: String,
    /// Filename or URL of the source
    pub source: String,
    /// Combined score rendered as a percentage with one decimal place
    pub score: String,
    /// Position of the chunk within its document
    pub chunk_index: usize,
}

/// Outcome of routing one chat turn
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub answer: String,
    pub mode: AnswerMode,
    pub sources: Vec<SourceRef>,
    /// How many chunks fed the grounded prompt; absent in open mode
    pub retrieved_count: Option<usize>,
    /// True when grounded mode found nothing above the fallback threshold
    pub no_relevant_results: bool,
}
