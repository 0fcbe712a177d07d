//! Deterministic local embedder for offline use and tests.

use super::{EmbeddingClient, EmbeddingError, EmbeddingTask};
use async_trait::async_trait;

/// Embedding client that folds text bytes into a normalized vector.
///
/// The vectors carry no semantics beyond rough lexical similarity; this
/// exists so the pipeline can run end-to-end without network credentials.
pub struct LocalEmbedder {
    dimension: usize,
}

impl LocalEmbedder {
    /// Construct a local embedder producing vectors of the given dimension.
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.dimension];
        if text.is_empty() || self.dimension == 0 {
            return embedding;
        }

        for (idx, byte) in text.bytes().enumerate() {
            let position = idx % self.dimension;
            embedding[position] += f32::from(byte) / 255.0;
        }

        let norm = embedding
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt();
        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingClient for LocalEmbedder {
    async fn embed(&self, text: &str, _task: EmbeddingTask) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.encode(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
