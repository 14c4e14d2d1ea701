//! Batching gateway in front of the embedding provider
//!
//! The gateway owns the provider handle and enforces the encoding contract:
//! inputs are truncated to the model's practical ceiling, batch requests fan
//! out under a bounded permit count while preserving input order, and every
//! returned vector is L2-normalized. Initialization is single-flight; a
//! failed first call is retried by the next caller.

use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::{OnceCell, Semaphore};

use crate::error::{Error, Result};
use crate::util::truncate_chars;

use super::EmbeddingProvider;

/// Serializes access to the embedding model
pub struct EmbedderGateway {
    provider: Arc<dyn EmbeddingProvider>,
    limiter: Arc<Semaphore>,
    max_input_chars: usize,
    ready: OnceCell<()>,
}

impl EmbedderGateway {
    /// Create a gateway with a concurrent fan-out of `batch_size`
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize, max_input_chars: usize) -> Self {
        Self {
            provider,
            limiter: Arc::new(Semaphore::new(batch_size.max(1))),
            max_input_chars,
            ready: OnceCell::new(),
        }
    }

    /// Output vector width
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Single-flight initialization: concurrent first calls share one
    /// health probe; success is cached, failure is retried next call.
    async fn ensure_ready(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                let healthy = self
                    .provider
                    .health_check()
                    .await
                    .map_err(|e| Error::EmbedderUnavailable(e.to_string()))?;
                if !healthy {
                    return Err(Error::EmbedderUnavailable(format!(
                        "embedding provider '{}' is not reachable",
                        self.provider.name()
                    )));
                }
                tracing::info!("embedding provider '{}' ready", self.provider.name());
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Embed one text, truncated and normalized
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.ensure_ready().await?;
        self.encode(text).await
    }

    /// Embed many texts with bounded concurrency, preserving input order
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_ready().await?;

        let futures = texts.iter().map(|text| {
            let limiter = Arc::clone(&self.limiter);
            async move {
                let _permit = limiter
                    .acquire()
                    .await
                    .map_err(|_| Error::internal("embedding limiter closed"))?;
                self.encode(text).await
            }
        });

        // join_all keeps output order aligned with input order
        join_all(futures).await.into_iter().collect()
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let input = truncate_chars(text, self.max_input_chars);
        let vector = self
            .provider
            .embed(input)
            .await
            .map_err(|e| Error::EmbedderUnavailable(e.to_string()))?;
        Ok(l2_normalize(vector))
    }
}

/// Scale a vector to unit L2 norm. Zero vectors are returned unchanged.
pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic fake: vector[0] = input length, rest zeros
    struct LengthEmbedder {
        calls: AtomicUsize,
        health_checks: AtomicUsize,
    }

    impl LengthEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                health_checks: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut v = vec![0.0; 4];
            v[0] = text.chars().count() as f32;
            v[1] = 1.0;
            Ok(v)
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn health_check(&self) -> Result<bool> {
            self.health_checks.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }

        fn name(&self) -> &str {
            "length-fake"
        }
    }

    #[tokio::test]
    async fn normalizes_output_vectors() {
        let provider = Arc::new(LengthEmbedder::new());
        let gateway = EmbedderGateway::new(provider, 4, 512);
        let v = gateway.embed_one("hello world").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn truncates_input_before_encoding() {
        let provider = Arc::new(LengthEmbedder::new());
        let gateway = EmbedderGateway::new(provider, 4, 512);
        let long = "x".repeat(2000);
        let short = "x".repeat(512);
        let a = gateway.embed_one(&long).await.unwrap();
        let b = gateway.embed_one(&short).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn batch_preserves_input_order() {
        let provider = Arc::new(LengthEmbedder::new());
        let gateway = EmbedderGateway::new(provider, 2, 512);
        let texts: Vec<String> = (1..=30).map(|n| "y".repeat(n)).collect();
        let vectors = gateway.embed_many(&texts).await.unwrap();
        assert_eq!(vectors.len(), texts.len());
        for (text, vector) in texts.iter().zip(&vectors) {
            // ratio of the two components survives normalization
            let ratio = vector[0] / vector[1];
            assert!((ratio - text.len() as f32).abs() < 1e-3);
        }
    }

    #[tokio::test]
    async fn initialization_is_single_flight() {
        let provider = Arc::new(LengthEmbedder::new());
        let gateway = Arc::new(EmbedderGateway::new(
            Arc::clone(&provider) as Arc<dyn EmbeddingProvider>,
            8,
            512,
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gw = Arc::clone(&gateway);
            handles.push(tokio::spawn(async move { gw.embed_one("ping").await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(provider.health_checks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_vector_is_left_unchanged() {
        assert_eq!(l2_normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }
}
