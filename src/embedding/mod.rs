//! Embedding client abstraction and provider adapters.

mod gemini;
mod jina;
mod local;

pub use gemini::GeminiEmbedder;
pub use jina::JinaEmbedder;
pub use local::LocalEmbedder;

use crate::config::{Config, ConfigError, EmbeddingProvider};
use async_trait::async_trait;
use thiserror::Error;

/// Task hint forwarded to providers that distinguish between indexing and
/// querying representations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingTask {
    /// Embedding a document chunk for storage.
    Document,
    /// Embedding a user query for retrieval.
    Query,
}

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider responded with an unexpected status code.
    #[error("Unexpected embedding response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: reqwest::StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider response did not contain a usable vector.
    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for one piece of text.
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>, EmbeddingError>;

    /// Dimensionality of the vectors this client produces.
    fn dimension(&self) -> usize;
}

/// Build the embedding client selected by the configuration.
///
/// Fails fast when the selected provider's credential is missing; a pipeline
/// without a working embedder cannot index or query.
pub fn client_from_config(config: &Config) -> Result<Box<dyn EmbeddingClient>, ConfigError> {
    let client: Box<dyn EmbeddingClient> = match config.embedding_provider {
        EmbeddingProvider::Gemini => Box::new(GeminiEmbedder::new(
            config.require_google_api_key()?,
            &config.embedding_model,
            config.embedding_dimension,
        )),
        EmbeddingProvider::Jina => Box::new(JinaEmbedder::new(
            config.require_jina_api_key()?,
            &config.embedding_model,
            config.embedding_dimension,
        )),
        EmbeddingProvider::Local => Box::new(LocalEmbedder::new(config.embedding_dimension)),
    };
    tracing::debug!(
        provider = ?config.embedding_provider,
        model = %config.embedding_model,
        dimension = config.embedding_dimension,
        "Initialized embedding client"
    );
    Ok(client)
}
