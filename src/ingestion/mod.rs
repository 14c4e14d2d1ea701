//! Document ingestion: multi-format extraction, chunking, keyword signatures

pub mod chunker;
pub mod extractor;
pub mod keywords;
pub mod web;

pub use chunker::TextChunker;
pub use extractor::{extract, Extraction};
pub use keywords::extract_keywords;
pub use web::UrlFetcher;
