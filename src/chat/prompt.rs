//! Prompt templates, fixed chat strings and citation formatting

use crate::types::{ScoredChunk, SourceRef};
use crate::util::truncate_chars;

/// System prompt for grounded answers. The retrieved context is appended.
pub const GROUNDED_SYSTEM_PROMPT: &str = "You are a helpful AI assistant answering questions \
about the user's documents.\n\
Use only the numbered context passages below. Cite the passages you rely on inline as [Source N].\n\
If the context does not contain the answer, say so plainly instead of inventing one.\n\
Keep answers concise.";

/// System prompt for open answers
pub const OPEN_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Provide accurate, helpful, and well-structured responses.";

/// Returned when grounded mode is requested against an empty corpus
pub const EMPTY_CORPUS_REFUSAL: &str = "No documents have been uploaded yet. Upload documents \
or switch to general mode to keep chatting.";

/// Returned when nothing clears even the fallback threshold
pub const NO_RELEVANT_RESULTS: &str =
    "I couldn't find relevant information in the documents to answer this question.";

/// Appended to the raw context when grounded mode runs without an LLM
pub const DEGRADED_GROUNDED_SUFFIX: &str =
    "\n\n(No language model is configured. The passages above are the raw retrieved context.)";

/// Canned open-mode answer when no LLM backend is configured
pub fn degraded_open_answer(query: &str) -> String {
    format!(
        "No language model is configured, so I can't answer \"{}\" right now. \
         Start a local Ollama server or set a provider API key to enable answers.",
        query
    )
}

/// Full grounded system prompt with the context block attached
pub fn grounded_system(context: &str) -> String {
    format!("{}\n\nCONTEXT:\n{}", GROUNDED_SYSTEM_PROMPT, context)
}

/// Concatenate retrieved chunks in rank order, each preceded by its source
/// line, entries separated by `---` dividers.
pub fn build_context(hits: &[ScoredChunk]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("[Source {} - {}]\n{}", i + 1, hit.metadata.source, hit.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Citation list shown to the client for the chunks behind an answer
pub fn build_source_refs(hits: &[ScoredChunk]) -> Vec<SourceRef> {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| SourceRef {
            id: i + 1,
            content: preview(&hit.content, 200),
            source: hit.metadata.source.clone(),
            score: format_score(hit.score),
            chunk_index: hit.metadata.chunk_index,
        })
        .collect()
}

/// Combined score as a percentage with one decimal place, clamped to
/// [0, 100] for display. The raw score can be slightly negative because the
/// cosine term can be; clamping is a presentation choice only.
pub fn format_score(score: f32) -> String {
    format!("{:.1}%", (score * 100.0).clamp(0.0, 100.0))
}

fn preview(content: &str, max_chars: usize) -> String {
    let truncated = truncate_chars(content, max_chars);
    if truncated.len() < content.len() {
        format!("{}...", truncated)
    } else {
        truncated.to_string()
    }
}
