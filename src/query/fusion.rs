//! Multi-variant retrieval fusion.
//!
//! Each query variant produced by decomposition is searched independently;
//! the result sets are concatenated into one context in a fixed priority
//! order (best, combined, original, then sub-queries), each block labeled
//! with the variant that produced it. There is no cross-variant re-ranking:
//! the order of blocks is the variant order, and within a block hits keep
//! the descending-score order returned by the index.

use super::decompose::QueryDecomposition;
use crate::config::Config;
use crate::embedding::{self, EmbeddingClient, EmbeddingTask};
use crate::qdrant::{CollectionStatus, QdrantError, QdrantService, ScoredPoint};
use crate::record::RecordPayload;
use futures_util::future::join_all;
use serde_json::Value;

use super::QuerySetupError;

/// Which decomposition variant produced a block of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryVariant {
    /// The variant judged most likely to retrieve well.
    Best,
    /// The synthesized combined query.
    Combined,
    /// The user's original query.
    Original,
    /// One decomposed sub-query, by position.
    Sub(usize),
}

impl QueryVariant {
    /// Human-readable label used in the fused context.
    pub fn label(&self) -> String {
        match self {
            Self::Best => "best query".to_string(),
            Self::Combined => "combined query".to_string(),
            Self::Original => "original query".to_string(),
            Self::Sub(position) => format!("sub-query {}", position + 1),
        }
    }
}

/// One scored hit copied out of the index.
#[derive(Debug, Clone)]
pub struct RetrievalHit {
    /// Point identifier assigned at indexing time.
    pub id: String,
    /// Similarity score reported by the index.
    pub score: f32,
    /// Copy of the stored record payload.
    pub payload: RecordPayload,
}

/// Results of one variant's search, in descending score order.
#[derive(Debug, Clone)]
pub struct VariantBlock {
    /// The variant that produced this block.
    pub variant: QueryVariant,
    /// The query text that was searched.
    pub query: String,
    /// Scored hits; empty when the search failed or matched nothing.
    pub hits: Vec<RetrievalHit>,
}

/// The fused retrieval context handed to answer generation.
#[derive(Debug, Clone, Default)]
pub struct FusedContext {
    /// Labeled blocks in fixed variant-priority order.
    pub blocks: Vec<VariantBlock>,
}

impl FusedContext {
    /// Whether no variant returned any hits. An empty context is a valid
    /// (if unhelpful) outcome; the answer layer reports it as "no
    /// information found".
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|block| block.hits.is_empty())
    }

    /// Render the context string consumed by answer generation.
    pub fn render(&self) -> String {
        let mut context = String::new();
        for block in &self.blocks {
            context.push_str(&format!(
                "\n=== Results for {}: {} ===\n",
                block.variant.label(),
                block.query
            ));
            for (position, hit) in block.hits.iter().enumerate() {
                context.push_str(&format!(
                    "\nResult #{} (Score: {:.4}):\n",
                    position + 1,
                    hit.score
                ));
                if !hit.payload.hierarchy.is_empty() {
                    context.push_str(&format!("Section: {}\n", hit.payload.hierarchy));
                }
                if !hit.payload.heading_code.is_empty() {
                    context.push_str(&format!("Code: {}\n", hit.payload.heading_code));
                }
                if !hit.payload.heading_title.is_empty() {
                    context.push_str(&format!("Title: {}\n", hit.payload.heading_title));
                }
                context.push_str(&format!("Text: {}\n---\n", hit.payload.text));
            }
        }
        context
    }
}

/// Determine the search plan for a query and its optional decomposition.
///
/// A missing or passthrough decomposition collapses to a single search over
/// the original query. Otherwise every variant is searched in the fixed
/// priority order, even when two variants carry identical text.
pub fn build_plan(
    query: &str,
    decomposition: Option<&QueryDecomposition>,
) -> Vec<(QueryVariant, String)> {
    match decomposition {
        Some(parts) if !parts.is_passthrough() => {
            let mut plan = vec![
                (QueryVariant::Best, parts.best_query.clone()),
                (QueryVariant::Combined, parts.combined_query.clone()),
                (QueryVariant::Original, parts.original_query.clone()),
            ];
            for (position, sub) in parts.sub_queries.iter().enumerate() {
                plan.push((QueryVariant::Sub(position), sub.clone()));
            }
            plan
        }
        _ => vec![(QueryVariant::Original, query.to_string())],
    }
}

/// Issues nearest-neighbor searches per query variant and fuses the results.
pub struct RetrievalService {
    embedding: Box<dyn EmbeddingClient>,
    qdrant: QdrantService,
    collection: String,
    top_k: usize,
}

impl RetrievalService {
    /// Build a service from explicit collaborators.
    pub fn new(
        embedding: Box<dyn EmbeddingClient>,
        qdrant: QdrantService,
        collection: String,
        top_k: usize,
    ) -> Self {
        Self {
            embedding,
            qdrant,
            collection,
            top_k: top_k.max(1),
        }
    }

    /// Build a service wired from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, QuerySetupError> {
        Ok(Self::new(
            embedding::client_from_config(config)?,
            QdrantService::from_config(config)?,
            config.collection.clone(),
            config.search_top_k,
        ))
    }

    /// Probe the collection so callers can distinguish "no data yet" from an
    /// empty search result.
    pub async fn collection_status(&self) -> Result<CollectionStatus, QdrantError> {
        self.qdrant.collection_status(&self.collection).await
    }

    /// Search every planned variant and fuse the results.
    ///
    /// Variant searches are independent and run concurrently; the fused
    /// block order is the fixed plan order regardless of which search
    /// returns first. A variant whose search or query embedding fails
    /// contributes an empty block instead of an error.
    pub async fn retrieve(
        &self,
        query: &str,
        decomposition: Option<&QueryDecomposition>,
    ) -> FusedContext {
        let plan = build_plan(query, decomposition);
        tracing::debug!(variants = plan.len(), "Running retrieval fusion");

        let searches = plan.into_iter().map(|(variant, text)| async move {
            let hits = self.search_variant(&text).await;
            VariantBlock {
                variant,
                query: text,
                hits,
            }
        });

        FusedContext {
            blocks: join_all(searches).await,
        }
    }

    async fn search_variant(&self, text: &str) -> Vec<RetrievalHit> {
        let vector = match self.embedding.embed(text, EmbeddingTask::Query).await {
            Ok(vector) => vector,
            Err(error) => {
                tracing::warn!(query = text, error = %error, "Query embedding failed; variant returns no results");
                return Vec::new();
            }
        };

        match self.qdrant.query(&self.collection, vector, self.top_k).await {
            Ok(points) => points.into_iter().map(point_to_hit).collect(),
            Err(error) => {
                tracing::warn!(query = text, error = %error, "Variant search failed; variant returns no results");
                Vec::new()
            }
        }
    }
}

fn point_to_hit(point: ScoredPoint) -> RetrievalHit {
    let ScoredPoint { id, score, payload } = point;
    let payload = payload
        .map(|map| serde_json::from_value(Value::Object(map)).unwrap_or_default())
        .unwrap_or_default();
    RetrievalHit { id, score, payload }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::LocalEmbedder;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn decomposition() -> QueryDecomposition {
        QueryDecomposition {
            sub_queries: vec!["height limits".into()],
            combined_query: "height and setbacks".into(),
            best_query: "height and setbacks".into(),
            original_query: "height".into(),
        }
    }

    fn hit(score: f32, hierarchy: &str, text: &str) -> RetrievalHit {
        RetrievalHit {
            id: "0".into(),
            score,
            payload: RecordPayload {
                text: text.into(),
                hierarchy: hierarchy.into(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn plan_orders_variants_by_fixed_priority() {
        let parts = decomposition();
        let plan = build_plan("height", Some(&parts));
        let variants: Vec<QueryVariant> = plan.iter().map(|(variant, _)| *variant).collect();
        assert_eq!(
            variants,
            vec![
                QueryVariant::Best,
                QueryVariant::Combined,
                QueryVariant::Original,
                QueryVariant::Sub(0),
            ]
        );
        // Identical best/combined text still yields two searches.
        assert_eq!(plan[0].1, plan[1].1);
    }

    #[test]
    fn plan_collapses_passthrough_to_single_variant() {
        let parts = QueryDecomposition::passthrough("height");
        let plan = build_plan("height", Some(&parts));
        assert_eq!(plan, vec![(QueryVariant::Original, "height".to_string())]);

        let plan = build_plan("height", None);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn render_labels_blocks_and_formats_hits() {
        let context = FusedContext {
            blocks: vec![
                VariantBlock {
                    variant: QueryVariant::Best,
                    query: "height and setbacks".into(),
                    hits: vec![hit(0.8213, "Permitted Uses > Setbacks", "rear yard text")],
                },
                VariantBlock {
                    variant: QueryVariant::Sub(0),
                    query: "height limits".into(),
                    hits: Vec::new(),
                },
            ],
        };

        let rendered = context.render();
        assert!(rendered.contains("=== Results for best query: height and setbacks ==="));
        assert!(rendered.contains("Result #1 (Score: 0.8213):"));
        assert!(rendered.contains("Section: Permitted Uses > Setbacks"));
        assert!(rendered.contains("Text: rear yard text"));
        // Empty blocks keep their label so the variant stays visible.
        assert!(rendered.contains("=== Results for sub-query 1: height limits ==="));
        assert!(!context.is_empty());
    }

    #[test]
    fn context_with_no_hits_anywhere_is_empty() {
        let context = FusedContext {
            blocks: vec![VariantBlock {
                variant: QueryVariant::Original,
                query: "height".into(),
                hits: Vec::new(),
            }],
        };
        assert!(context.is_empty());
        assert!(context.render().contains("original query"));
    }

    #[tokio::test]
    async fn retrieve_issues_one_search_per_variant_in_order() {
        let server = MockServer::start_async().await;
        let query_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/collections/demo/points/query");
                then.status(200).json_body(json!({
                    "result": {
                        "points": [
                            { "id": 1, "score": 0.9, "payload": { "text": "chunk", "hierarchy": "Permitted Uses" } }
                        ]
                    }
                }));
            })
            .await;

        let service = RetrievalService::new(
            Box::new(LocalEmbedder::new(4)),
            QdrantService::new(&server.base_url(), None).expect("client"),
            "demo".into(),
            3,
        );
        let parts = decomposition();
        let context = service.retrieve("height", Some(&parts)).await;

        assert_eq!(query_mock.hits_async().await, 4);
        assert_eq!(context.blocks.len(), 4);
        assert_eq!(context.blocks[0].variant, QueryVariant::Best);
        assert_eq!(context.blocks[1].variant, QueryVariant::Combined);
        assert_eq!(context.blocks[2].variant, QueryVariant::Original);
        assert_eq!(context.blocks[3].variant, QueryVariant::Sub(0));
        assert!(context.blocks.iter().all(|block| block.hits.len() == 1));
    }

    #[tokio::test]
    async fn missing_collection_degrades_to_empty_blocks() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/collections/demo/points/query");
                then.status(404).body("collection not found");
            })
            .await;

        let service = RetrievalService::new(
            Box::new(LocalEmbedder::new(4)),
            QdrantService::new(&server.base_url(), None).expect("client"),
            "demo".into(),
            3,
        );
        let context = service.retrieve("height", None).await;

        assert_eq!(context.blocks.len(), 1);
        assert!(context.is_empty());
    }
}
