//! Chunk record construction and the payload layout stored in Qdrant.

use crate::hierarchy::{HeadingKind, HeadingMatch, HIERARCHY_DELIMITER};
use crate::loader::DocumentChunk;
use serde::{Deserialize, Serialize};

/// Payload stored alongside each vector in the collection.
///
/// The field set is fixed: retrieval formatting and the answer prompt both
/// rely on these keys. Absent metadata is stored as its sentinel (`0` for
/// `page`, empty string for `source` and the heading fields) rather than
/// omitted, so payloads stay uniform across a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPayload {
    /// Raw chunk text.
    pub text: String,
    /// Section code or sub-clause label, empty for body chunks.
    #[serde(default)]
    pub heading_code: String,
    /// Heading title, empty for body chunks.
    #[serde(default)]
    pub heading_title: String,
    /// Full ancestor path, root-to-leaf, joined with `" > "`.
    #[serde(default)]
    pub hierarchy: String,
    /// Nesting level of the chunk's heading.
    #[serde(default)]
    pub level: u64,
    /// One-based page number from the loader, 0 when unknown.
    #[serde(default)]
    pub page: u64,
    /// Origin document identifier, empty when unknown.
    #[serde(default)]
    pub source: String,
    /// Ordinal position of the chunk in the processed sequence.
    #[serde(default)]
    pub chunk_index: u64,
}

/// One storable unit: vector plus payload, keyed by the chunk ordinal.
///
/// The ordinal doubles as the Qdrant point id, so re-indexing a document with
/// the same chunking parameters overwrites prior records in place instead of
/// appending duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    /// Dense zero-based identifier, assigned by chunk order.
    pub id: u64,
    /// Embedding vector for the chunk text.
    pub vector: Vec<f32>,
    /// Searchable metadata stored with the vector.
    pub payload: RecordPayload,
}

/// Assemble the record for one chunk from its heading outcome, resolved
/// hierarchy path, and embedding vector.
pub fn build_record(
    chunk: &DocumentChunk,
    heading: Option<&HeadingMatch>,
    hierarchy: &str,
    vector: Vec<f32>,
) -> ChunkRecord {
    let (heading_code, heading_title, level) = match heading {
        Some(matched) => {
            let level = match &matched.kind {
                HeadingKind::Numbered { level, .. } => *level as u64,
                // Labels carry no code depth of their own; record the depth of
                // the path they were appended to.
                HeadingKind::SubClause { .. } => {
                    let segments = hierarchy.split(HIERARCHY_DELIMITER).count() as u64;
                    segments.saturating_sub(1)
                }
            };
            (matched.code().to_string(), matched.title.clone(), level)
        }
        None => (String::new(), String::new(), 0),
    };

    ChunkRecord {
        id: chunk.ordinal as u64,
        vector,
        payload: RecordPayload {
            text: chunk.text.clone(),
            heading_code,
            heading_title,
            hierarchy: hierarchy.to_string(),
            level,
            page: chunk.page.unwrap_or(0),
            source: chunk.source.clone().unwrap_or_default(),
            chunk_index: chunk.ordinal as u64,
        },
    }
}
