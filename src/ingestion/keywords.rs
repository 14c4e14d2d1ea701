//! Salient keyword extraction for sparse retrieval signals

use std::collections::HashMap;

/// Maximum keywords kept per chunk or query
pub const MAX_KEYWORDS: usize = 20;

/// Canonical stop-word set. Tokens in this set never become keywords.
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "shall", "can", "need",
    "it", "its", "this", "that", "these", "those", "i", "you", "he", "she", "we", "they", "what",
    "which", "who", "when", "where", "why", "how", "all", "each", "every", "both", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "just", "as", "if", "then", "because", "while", "although",
];

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Extract up to [`MAX_KEYWORDS`] salient lowercase tokens from `text`.
///
/// Tokens are ordered by descending frequency, ties broken by first
/// appearance. Tokens of length <= 2 and stop-words are dropped.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();

    // (count, first appearance) per token
    let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut position = 0usize;

    for token in lowered.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
        if token.chars().count() <= 2 || is_stopword(token) {
            continue;
        }
        let entry = stats.entry(token).or_insert((0, position));
        entry.0 += 1;
        position += 1;
    }

    let mut ranked: Vec<(&str, (usize, usize))> = stats.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked.truncate(MAX_KEYWORDS);

    ranked.into_iter().map(|(token, _)| token.to_string()).collect()
}
