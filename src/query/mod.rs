//! Query-time pipeline: decomposition, retrieval fusion, and answer generation.

pub mod answer;
pub mod chat;
pub mod decompose;
pub mod fusion;

pub use answer::{AnswerService, NO_INFORMATION_MESSAGE};
pub use chat::{ChatClient, ChatError, OpenAiCompatChat};
pub use decompose::{LlmDecomposer, QueryDecomposer, QueryDecomposition};
pub use fusion::{FusedContext, QueryVariant, RetrievalHit, RetrievalService, VariantBlock};

use crate::config::ConfigError;
use crate::qdrant::QdrantError;
use thiserror::Error;

/// Errors raised while wiring the query pipeline from configuration.
#[derive(Debug, Error)]
pub enum QuerySetupError {
    /// Required configuration for a collaborator was missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Qdrant transport could not be constructed.
    #[error("Qdrant request failed: {0}")]
    Qdrant(#[from] QdrantError),
}
