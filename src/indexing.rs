//! Document indexing pipeline: headings, hierarchy, embeddings, and Qdrant writes.

use crate::config::{Config, ConfigError};
use crate::embedding::{self, EmbeddingClient, EmbeddingTask};
use crate::hierarchy::{
    resolve_hierarchies, HeadingMatch, HeadingProfile, HierarchyStrategy,
};
use crate::loader::DocumentChunk;
use crate::metrics::{IngestMetrics, MetricsSnapshot};
use crate::qdrant::{QdrantError, QdrantService};
use crate::record::build_record;
use std::sync::Arc;
use thiserror::Error;

/// Errors emitted by the indexing pipeline.
#[derive(Debug, Error)]
pub enum IndexingError {
    /// Required configuration for a collaborator was missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Qdrant interaction failed while preparing the collection.
    #[error("Qdrant request failed: {0}")]
    Qdrant(#[from] QdrantError),
}

/// Tunables for one indexing run.
#[derive(Debug, Clone)]
pub struct IndexingOptions {
    /// Target collection name.
    pub collection: String,
    /// Number of records sent per upsert request. Batching amortizes network
    /// round-trips only; correctness does not depend on it.
    pub batch_size: usize,
    /// Hierarchy reconstruction strategy.
    pub strategy: HierarchyStrategy,
}

/// Summary of a completed indexing run.
#[derive(Debug, Clone, Copy)]
pub struct IndexSummary {
    /// Number of records the run prepared.
    pub expected: usize,
    /// Number of records Qdrant acknowledged.
    pub upserted: usize,
    /// Chunks whose embedding call failed and fell back to a zero vector.
    pub degraded: usize,
}

impl IndexSummary {
    /// Whether every prepared record reached the store.
    pub fn is_complete(&self) -> bool {
        self.upserted == self.expected
    }
}

/// Outcome of embedding one chunk during indexing.
///
/// Degradation is a first-class outcome, not a silent fallback: the reason is
/// logged and the substitution counted in the run summary.
enum EmbeddingOutcome {
    Embedded(Vec<f32>),
    Degraded { reason: String },
}

/// Coordinates the full ingestion pipeline for one document at a time:
/// heading detection, hierarchy resolution, embedding, and batched upserts.
///
/// The service owns long-lived handles to the embedding client and Qdrant
/// transport; hierarchy state is rebuilt from scratch for every document so
/// nothing leaks across indexing runs.
pub struct IndexingService {
    embedding: Box<dyn EmbeddingClient>,
    qdrant: QdrantService,
    profile: HeadingProfile,
    options: IndexingOptions,
    metrics: Arc<IngestMetrics>,
}

impl IndexingService {
    /// Build a service from explicit collaborators.
    pub fn new(
        embedding: Box<dyn EmbeddingClient>,
        qdrant: QdrantService,
        profile: HeadingProfile,
        options: IndexingOptions,
    ) -> Self {
        Self {
            embedding,
            qdrant,
            profile,
            options,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Build a service wired from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, IndexingError> {
        Ok(Self::new(
            embedding::client_from_config(config)?,
            QdrantService::from_config(config)?,
            config.heading_profile(),
            IndexingOptions {
                collection: config.collection.clone(),
                batch_size: config.upsert_batch_size.max(1),
                strategy: HierarchyStrategy::Lookahead,
            },
        ))
    }

    /// Index one document's chunks, in document order.
    ///
    /// Embedding failures never abort the run: the affected chunk is stored
    /// with a zero-vector placeholder so the gap stays visible downstream via
    /// low similarity scores, and the substitution is counted in the summary.
    /// Upsert failures stop the remaining batches and surface as a partial
    /// summary rather than an error.
    pub async fn index_document(
        &self,
        chunks: &[DocumentChunk],
    ) -> Result<IndexSummary, IndexingError> {
        let collection = self.options.collection.as_str();
        tracing::info!(collection, chunks = chunks.len(), "Indexing document");

        let dimension = self.embedding.dimension();
        self.qdrant
            .ensure_collection(collection, dimension as u64)
            .await?;

        let headings: Vec<Option<HeadingMatch>> = chunks
            .iter()
            .map(|chunk| self.profile.parse(&chunk.text))
            .collect();
        let hierarchies = resolve_hierarchies(&headings, self.options.strategy);

        let mut records = Vec::with_capacity(chunks.len());
        let mut degraded = 0usize;
        for ((chunk, heading), hierarchy) in chunks.iter().zip(&headings).zip(&hierarchies) {
            let vector = match self.embed_chunk(chunk).await {
                EmbeddingOutcome::Embedded(vector) => vector,
                EmbeddingOutcome::Degraded { reason } => {
                    degraded += 1;
                    tracing::warn!(
                        ordinal = chunk.ordinal,
                        reason = %reason,
                        "Embedding degraded; substituting zero vector"
                    );
                    vec![0.0; dimension]
                }
            };
            records.push(build_record(chunk, heading.as_ref(), hierarchy, vector));
        }

        let batch_size = self.options.batch_size.max(1);
        let total_batches = records.len().div_ceil(batch_size).max(1);
        let mut upserted = 0usize;
        for (position, batch) in records.chunks(batch_size).enumerate() {
            match self.qdrant.upsert_records(collection, batch).await {
                Ok(count) => {
                    upserted += count;
                    tracing::info!(
                        collection,
                        batch = position + 1,
                        total_batches,
                        "Upserted batch"
                    );
                }
                Err(error) => {
                    tracing::error!(
                        collection,
                        batch = position + 1,
                        total_batches,
                        error = %error,
                        "Upsert batch failed; stopping"
                    );
                    break;
                }
            }
        }

        let summary = IndexSummary {
            expected: records.len(),
            upserted,
            degraded,
        };
        self.metrics
            .record_document(summary.upserted as u64, summary.degraded as u64);
        tracing::info!(
            collection,
            expected = summary.expected,
            upserted = summary.upserted,
            degraded = summary.degraded,
            complete = summary.is_complete(),
            "Document indexed"
        );
        Ok(summary)
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn embed_chunk(&self, chunk: &DocumentChunk) -> EmbeddingOutcome {
        match self
            .embedding
            .embed(&chunk.text, EmbeddingTask::Document)
            .await
        {
            Ok(vector) => EmbeddingOutcome::Embedded(vector),
            Err(error) => EmbeddingOutcome::Degraded {
                reason: error.to_string(),
            },
        }
    }
}
