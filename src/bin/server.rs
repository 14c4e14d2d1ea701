//! RAG chat server binary
//!
//! Run with: cargo run --bin corpus-rag-server

use corpus_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "corpus_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::from_env();

    tracing::info!("configuration loaded");
    tracing::info!("  - embedding model: {}", config.embedding.model);
    tracing::info!("  - embedding dimensions: {}", config.embedding.dimensions);
    tracing::info!("  - chunk size / overlap: {} / {}", config.chunking.chunk_size, config.chunking.chunk_overlap);
    tracing::info!("  - relevance threshold: {}", config.router.relevance_threshold);

    let server = RagServer::new(config).await?;

    println!("\nServer starting on http://{}", server.address());
    println!("Endpoints:");
    println!("  POST /api/documents/upload - upload documents");
    println!("  POST /api/documents/url    - ingest a web page");
    println!("  POST /api/chat             - chat (auto / rag / general)");
    println!("  POST /api/search           - direct hybrid search");
    println!("  GET  /api/documents        - list documents");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
