//! Hybrid retrieval: chunk index and document registry

pub mod registry;
pub mod store;

pub use registry::DocumentRegistry;
pub use store::{HybridIndex, DEFAULT_TOP_K};
