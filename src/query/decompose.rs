//! Query decomposition over a chat completion endpoint.

use super::chat::ChatClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DECOMPOSITION_PROMPT: &str = r#"You are a zoning by-law query decomposition assistant trained in urban planning, land-use regulations, and municipal building code language.

Take a complex zoning-related user query and break it into independent, well-formed sub-queries for semantic document retrieval. Also produce one combined query capturing the intent of the whole, and select one best query optimized for high-precision retrieval.

Guidelines:
- One sub-query per zoning concept mentioned (e.g. setbacks, height, separation, lot coverage).
- Use domain-specific planning language; each sub-query must be clear, self-contained, and semantically rich.
- Avoid vague formulations like "tell me more".

Return ONLY valid JSON in exactly this structure, with no additional text:

{
  "sub_queries": ["..."],
  "combined_query": "...",
  "best_query": "...",
  "original_query": "..."
}"#;

/// A user query decomposed into retrieval variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDecomposition {
    /// One retrieval query per concept found in the original query.
    pub sub_queries: Vec<String>,
    /// Single query synthesizing all concepts together.
    pub combined_query: String,
    /// The variant judged most likely to retrieve well.
    pub best_query: String,
    /// The user's query, verbatim.
    pub original_query: String,
}

impl QueryDecomposition {
    /// The degraded shape: every field echoes the original query.
    ///
    /// Produced whenever decomposition fails; retrieval fusion collapses this
    /// shape to a single search over the original query.
    pub fn passthrough(query: &str) -> Self {
        Self {
            sub_queries: vec![query.to_string()],
            combined_query: query.to_string(),
            best_query: query.to_string(),
            original_query: query.to_string(),
        }
    }

    /// Whether this decomposition carries no information beyond the original
    /// query.
    pub fn is_passthrough(&self) -> bool {
        self.combined_query == self.original_query
            && self.best_query == self.original_query
            && self
                .sub_queries
                .iter()
                .all(|sub| sub == &self.original_query)
    }
}

/// Interface implemented by query decomposition backends.
#[async_trait]
pub trait QueryDecomposer: Send + Sync {
    /// Decompose a free-text query. Never fails: any backend problem
    /// degrades to the passthrough shape.
    async fn decompose(&self, query: &str) -> QueryDecomposition;
}

/// Decomposer backed by a chat completion endpoint.
pub struct LlmDecomposer {
    chat: Box<dyn ChatClient>,
}

impl LlmDecomposer {
    /// Construct a decomposer over the given chat client.
    pub fn new(chat: Box<dyn ChatClient>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl QueryDecomposer for LlmDecomposer {
    async fn decompose(&self, query: &str) -> QueryDecomposition {
        let raw = match self.chat.complete(DECOMPOSITION_PROMPT, query).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(error = %error, "Query decomposition failed; passing query through");
                return QueryDecomposition::passthrough(query);
            }
        };

        match parse_decomposition(&raw) {
            Some(parsed) => {
                tracing::debug!(
                    sub_queries = parsed.sub_queries.len(),
                    "Query decomposed"
                );
                parsed
            }
            None => {
                tracing::warn!("Decomposition response was not valid JSON; passing query through");
                QueryDecomposition::passthrough(query)
            }
        }
    }
}

/// Parse a decomposition reply, tolerating markdown code fences around the
/// JSON body.
fn parse_decomposition(raw: &str) -> Option<QueryDecomposition> {
    let cleaned = strip_code_fences(raw);
    let parsed: QueryDecomposition = serde_json::from_str(cleaned).ok()?;
    if parsed.sub_queries.is_empty()
        || parsed.combined_query.trim().is_empty()
        || parsed.best_query.trim().is_empty()
        || parsed.original_query.trim().is_empty()
    {
        return None;
    }
    Some(parsed)
}

fn strip_code_fences(raw: &str) -> &str {
    let mut cleaned = raw;
    if let Some((_, rest)) = cleaned.split_once("```json") {
        cleaned = rest;
    }
    if let Some((body, _)) = cleaned.split_once("```") {
        cleaned = body;
    }
    cleaned.trim()
}
