#![deny(missing_docs)]

//! Core library for the zoning-qa document question-answering pipeline.

/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and provider adapters.
pub mod embedding;
/// Heading detection and hierarchy reconstruction.
pub mod hierarchy;
/// Document indexing pipeline.
pub mod indexing;
/// Document loading and token-aware chunking.
pub mod loader;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Qdrant vector store integration.
pub mod qdrant;
/// Query decomposition, retrieval fusion, and answer generation.
pub mod query;
/// Chunk record construction and payload layout.
pub mod record;
