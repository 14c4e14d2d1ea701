//! Configuration for the RAG chat service

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embedding: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Routing and retrieval thresholds
    pub router: RouterConfig,
    /// LLM backend configuration
    pub llm: LlmConfig,
}

impl RagConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0".to_string()),
                port: env_or("PORT", 8000),
                ..ServerConfig::default()
            },
            embedding: EmbeddingConfig {
                model: env_or("EMBEDDING_MODEL", "nomic-embed-text".to_string()),
                dimensions: env_or("EMBEDDING_DIMENSIONS", 768),
                batch_size: env_or("EMBED_BATCH_SIZE", 20),
                ..EmbeddingConfig::default()
            },
            chunking: ChunkingConfig {
                chunk_size: env_or("CHUNK_SIZE", 800),
                chunk_overlap: env_or("CHUNK_OVERLAP", 200),
            },
            router: RouterConfig {
                relevance_threshold: env_or("RELEVANCE_THRESHOLD", 0.15),
                ..RouterConfig::default()
            },
            llm: LlmConfig {
                ollama_base_url: env_or("OLLAMA_BASE_URL", "http://localhost:11434".to_string()),
                ollama_model: env_or("OLLAMA_MODEL", "llama3.2".to_string()),
                openai_api_key: env_or("OPENAI_API_KEY", String::new()),
                openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini".to_string()),
                deepseek_api_key: env_or("DEEPSEEK_API_KEY", String::new()),
                deepseek_model: env_or("DEEPSEEK_MODEL", "deepseek-chat".to_string()),
                default_model: env_or("DEFAULT_MODEL", "ollama-llama3.2".to_string()),
                ..LlmConfig::default()
            },
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable permissive CORS
    pub enable_cors: bool,
    /// Maximum size of a single uploaded file in bytes
    pub max_file_size: usize,
    /// Maximum number of files per upload request
    pub max_files_per_upload: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_file_size: 50 * 1024 * 1024, // 50MB per file
            max_files_per_upload: 10,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
    /// Concurrent request fan-out for batch encoding
    pub batch_size: usize,
    /// Input is truncated to this many characters before encoding
    pub max_input_chars: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 20,
            max_input_chars: 512,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 200,
        }
    }
}

/// Routing and retrieval thresholds for the chat router
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Minimum combined score for a chunk to count as relevant in grounded mode
    pub relevance_threshold: f32,
    /// Lower bound used only when the primary threshold yields nothing
    pub fallback_threshold: f32,
    /// Top-k passed to hybrid search
    pub retrieval_k: usize,
    /// Maximum chunks kept from the fallback pass
    pub fallback_k: usize,
    /// Trailing history messages included in the prompt
    pub history_window: usize,
    /// Terms that force auto mode to grounded when present in the query
    pub doc_keyword_hints: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.15,
            fallback_threshold: 0.10,
            retrieval_k: 8,
            fallback_k: 5,
            history_window: 6,
            doc_keyword_hints: [
                "document",
                "file",
                "uploaded",
                "says",
                "mentioned",
                "according to",
                "in the",
                "from the",
                "based on",
                "what does",
                "find",
                "search",
                "look for",
                "locate",
                "extract",
                "summarize",
                "summary",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// LLM backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the local Ollama server
    pub ollama_base_url: String,
    /// Ollama chat model name
    pub ollama_model: String,
    /// OpenAI API key (empty disables the backend)
    pub openai_api_key: String,
    /// OpenAI chat model name
    pub openai_model: String,
    /// DeepSeek API key (empty disables the backend)
    pub deepseek_api_key: String,
    /// DeepSeek chat model name
    pub deepseek_model: String,
    /// Model id preselected at startup
    pub default_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for failed backend requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2".to_string(),
            openai_api_key: String::new(),
            openai_model: "gpt-4o-mini".to_string(),
            deepseek_api_key: String::new(),
            deepseek_model: "deepseek-chat".to_string(),
            default_model: "ollama-llama3.2".to_string(),
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}
