//! Document loading and token-aware chunking.
//!
//! PDF text extraction stays outside this crate; the loader consumes a UTF-8
//! text export in which page boundaries are marked with form feeds (`\x0c`),
//! which is what the upstream extractor emits. Each page is split into
//! token-budgeted chunks with an optional sliding overlap, and every chunk
//! keeps its page number and source path as metadata.

use semchunk_rs::Chunker;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tiktoken_rs::cl100k_base;

type TokenCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// Default token budget per chunk when no override is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Errors produced while turning a document into chunks.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Document file could not be read.
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    /// Ingestion configured an impossible token budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// A contiguous span of document text, immutable once split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChunk {
    /// Raw chunk text.
    pub text: String,
    /// Position of the chunk in document order.
    pub ordinal: usize,
    /// One-based page the chunk came from, when known.
    pub page: Option<u64>,
    /// Origin document identifier, when known.
    pub source: Option<String>,
}

/// Read a document export from disk and split it into ordered chunks.
pub fn load_document(
    path: &Path,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<DocumentChunk>, LoaderError> {
    let text = std::fs::read_to_string(path)?;
    let source = path.to_string_lossy().to_string();
    split_document(&text, Some(&source), chunk_size, overlap)
}

/// Split already-loaded document text into ordered chunks.
///
/// Pages are separated by form feeds; page numbers are one-based. Ordinals
/// are dense across the whole document, not per page.
pub fn split_document(
    text: &str,
    source: Option<&str>,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<DocumentChunk>, LoaderError> {
    if chunk_size == 0 {
        return Err(LoaderError::InvalidChunkSize);
    }

    let counter = build_token_counter();
    let has_pages = text.contains('\u{c}');
    let mut chunks = Vec::new();

    for (page_index, page_text) in text.split('\u{c}').enumerate() {
        let page = has_pages.then_some(page_index as u64 + 1);
        for piece in chunk_text(page_text, chunk_size, overlap, &counter) {
            chunks.push(DocumentChunk {
                text: piece,
                ordinal: chunks.len(),
                page,
                source: source.map(|value| value.to_string()),
            });
        }
    }

    tracing::debug!(
        chunks = chunks.len(),
        chunk_size,
        overlap,
        "Split document into chunks"
    );
    Ok(chunks)
}

/// Build the token counter used for chunk budgeting.
///
/// Uses the `cl100k_base` encoding; falls back to whitespace counting when
/// the tokenizer data is unavailable, logged at warn level so ingestion keeps
/// flowing.
fn build_token_counter() -> TokenCounter {
    match cl100k_base() {
        Ok(encoding) => {
            let encoding = Arc::new(encoding);
            Arc::new(move |segment: &str| encoding.encode_ordinary(segment).len())
        }
        Err(source) => {
            tracing::warn!(error = %source, "Tokenizer unavailable; falling back to whitespace counter");
            whitespace_counter()
        }
    }
}

fn whitespace_counter() -> TokenCounter {
    Arc::new(|segment: &str| {
        let tokens = segment.split_whitespace().count();
        if tokens == 0 && !segment.is_empty() {
            1
        } else {
            tokens
        }
    })
}

/// Chunk text into semantic segments within the token budget, then apply the
/// sliding overlap between adjacent segments.
fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    counter: &TokenCounter,
) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let counter_for_chunker = counter.clone();
    let chunker = Chunker::new(
        chunk_size,
        Box::new(move |segment: &str| counter_for_chunker.as_ref()(segment)),
    );
    let base = chunker.chunk(text);
    apply_overlap(base, chunk_size, overlap, counter)
}

/// Prefix each chunk after the first with the token-limited tail of its
/// predecessor, so spans around boundaries remain visible to retrieval.
fn apply_overlap(
    chunks: Vec<String>,
    chunk_size: usize,
    overlap: usize,
    counter: &TokenCounter,
) -> Vec<String> {
    let effective = overlap.min(chunk_size.saturating_sub(1));
    if effective == 0 || chunks.len() < 2 {
        return chunks;
    }

    let mut overlapped = Vec::with_capacity(chunks.len());
    for (position, current) in chunks.iter().enumerate() {
        if position == 0 {
            overlapped.push(current.clone());
            continue;
        }
        let tail = token_tail(&chunks[position - 1], effective, counter);
        if tail.is_empty() {
            overlapped.push(current.clone());
        } else {
            overlapped.push(format!("{tail} {current}"));
        }
    }
    overlapped
}

/// The suffix of `text` containing at most `token_limit` tokens, split on
/// whitespace boundaries.
fn token_tail(text: &str, token_limit: usize, counter: &TokenCounter) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    for start in (0..words.len()).rev() {
        let candidate = words[start..].join(" ");
        if counter.as_ref()(&candidate) <= token_limit {
            if start == 0 {
                return candidate;
            }
            continue;
        }
        return words[start + 1..].join(" ");
    }
    text.trim().to_string()
}
