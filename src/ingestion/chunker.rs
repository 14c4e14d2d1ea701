//! Sentence-respecting chunker with word-approximated overlap

use regex::Regex;

use crate::types::{ChunkDraft, ChunkMetadata, SourceInfo};

/// Text chunker with configurable size and overlap
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. Overlap is capped below `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    /// Split `text` into overlapping, sentence-boundary-respecting drafts.
    ///
    /// A single sentence longer than the chunk size becomes one oversize
    /// chunk; sentences are never split mid-way. Empty input yields no
    /// drafts.
    pub fn chunk(&self, text: &str, source: &SourceInfo) -> Vec<ChunkDraft> {
        let text = normalize_newlines(text);
        let sentences = split_sentences(&text);

        let mut drafts = Vec::new();
        let mut buffer = String::new();

        for sentence in sentences {
            if !buffer.is_empty() && buffer.len() + 1 + sentence.len() > self.chunk_size {
                self.push_draft(&mut drafts, &buffer, source);
                buffer = self.overlap_seed(&buffer);
            }
            if !buffer.is_empty() {
                buffer.push(' ');
            }
            buffer.push_str(sentence);
        }

        if !buffer.trim().is_empty() {
            self.push_draft(&mut drafts, &buffer, source);
        }

        drafts
    }

    fn push_draft(&self, drafts: &mut Vec<ChunkDraft>, buffer: &str, source: &SourceInfo) {
        let content = buffer.trim().to_string();
        let chunk_index = drafts.len();
        let char_start = chunk_index * (self.chunk_size - self.overlap);
        let char_end = char_start + content.len();

        drafts.push(ChunkDraft {
            metadata: ChunkMetadata {
                source: source.source.clone(),
                kind: source.kind,
                chunk_index,
                char_start,
                char_end,
                title: source.title.clone(),
            },
            content,
        });
    }

    /// Trailing words of an emitted chunk that seed the next buffer.
    /// Character-level overlap approximated by word boundaries.
    fn overlap_seed(&self, emitted: &str) -> String {
        let words: Vec<&str> = emitted.split_whitespace().collect();
        let take = ((self.overlap as f64 / self.chunk_size as f64) * words.len() as f64).ceil() as usize;
        words[words.len().saturating_sub(take)..].join(" ")
    }
}

/// Normalize line endings and collapse runs of 3+ newlines to exactly 2
fn normalize_newlines(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let blanks = Regex::new(r"\n{3,}").expect("static regex");
    blanks.replace_all(&text, "\n\n").into_owned()
}

/// Split into sentences at terminal punctuation followed by whitespace, or
/// at a run of 2+ newlines. Sentences are trimmed; empties are dropped.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'.' | b'!' | b'?' => {
                if i + 1 >= bytes.len() || bytes[i + 1].is_ascii_whitespace() {
                    push_trimmed(&mut sentences, &text[start..=i]);
                    start = i + 1;
                }
            }
            b'\n' if i + 1 < bytes.len() && bytes[i + 1] == b'\n' => {
                push_trimmed(&mut sentences, &text[start..i]);
                while i < bytes.len() && bytes[i] == b'\n' {
                    i += 1;
                }
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, raw: &'a str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}
