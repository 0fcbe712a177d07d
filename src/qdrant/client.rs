//! HTTP client wrapper for interacting with Qdrant.

use crate::config::Config;
use crate::qdrant::types::{
    CollectionInfoResponse, CollectionStatus, QdrantError, QueryResponse, QueryResponseResult,
    ScoredPoint,
};
use crate::record::ChunkRecord;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};

/// Lightweight HTTP client for the Qdrant operations this pipeline needs.
pub struct QdrantService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl QdrantService {
    /// Construct a new client for the given Qdrant endpoint.
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self, QdrantError> {
        let client = Client::builder()
            .user_agent("zoning-qa/0.2")
            .build()?;
        let base_url = normalize_base_url(url).map_err(QdrantError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = api_key.as_deref().map(|value| !value.is_empty()).unwrap_or(false),
            "Initialized Qdrant HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Construct a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, QdrantError> {
        Self::new(&config.qdrant_url, config.qdrant_api_key.clone())
    }

    /// Report whether a collection exists and how many points it holds.
    pub async fn collection_status(
        &self,
        collection_name: &str,
    ) -> Result<CollectionStatus, QdrantError> {
        let response = self
            .request(Method::GET, &format!("collections/{collection_name}"))?
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(CollectionStatus::Missing),
            status if status.is_success() => {
                let payload: CollectionInfoResponse = response.json().await?;
                Ok(CollectionStatus::Ready {
                    points_count: payload.result.points_count.unwrap_or(0),
                })
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = QdrantError::UnexpectedStatus { status, body };
                tracing::error!(collection = collection_name, error = %error, "Collection status check failed");
                Err(error)
            }
        }
    }

    /// Create a collection with the given vector size and cosine distance,
    /// only when it is missing from Qdrant.
    pub async fn ensure_collection(
        &self,
        collection_name: &str,
        vector_size: u64,
    ) -> Result<(), QdrantError> {
        if self.collection_status(collection_name).await? != CollectionStatus::Missing {
            return Ok(());
        }

        tracing::debug!(
            collection = collection_name,
            vector_size,
            "Creating collection"
        );
        let body = json!({
            "vectors": {
                "size": vector_size,
                "distance": "Cosine"
            }
        });

        let response = self
            .request(Method::PUT, &format!("collections/{collection_name}"))?
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection = collection_name, "Collection created");
        })
        .await
    }

    /// Upsert chunk records into the given collection.
    ///
    /// Record ids are the dense chunk ordinals, so re-upserting the same
    /// document overwrites prior points at the same positions.
    pub async fn upsert_records(
        &self,
        collection_name: &str,
        records: &[ChunkRecord],
    ) -> Result<usize, QdrantError> {
        if records.is_empty() {
            return Ok(0);
        }

        let points: Vec<Value> = records
            .iter()
            .map(|record| {
                json!({
                    "id": record.id,
                    "vector": record.vector,
                    "payload": serde_json::to_value(&record.payload).unwrap_or(Value::Null),
                })
            })
            .collect();
        let point_count = points.len();

        let response = self
            .request(
                Method::PUT,
                &format!("collections/{collection_name}/points"),
            )?
            .query(&[("wait", true)])
            .json(&json!({ "points": points }))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(
                collection = collection_name,
                points = point_count,
                "Points upserted"
            );
        })
        .await?;

        Ok(point_count)
    }

    /// Perform a nearest-neighbor search, returning scored payloads ordered
    /// by descending similarity.
    pub async fn query(
        &self,
        collection_name: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, QdrantError> {
        let body = json!({
            "query": vector,
            "limit": limit,
            "with_payload": true,
        });

        let response = self
            .request(
                Method::POST,
                &format!("collections/{collection_name}/points/query"),
            )?
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = QdrantError::UnexpectedStatus { status, body };
            tracing::warn!(collection = collection_name, error = %error, "Qdrant search failed");
            return Err(error);
        }

        let payload: QueryResponse = response.json().await?;
        let points = match payload.result {
            QueryResponseResult::Points(points) => points,
            QueryResponseResult::Object { points } => points,
        };
        Ok(points
            .into_iter()
            .map(|point| ScoredPoint {
                id: stringify_point_id(point.id),
                score: point.score,
                payload: point.payload,
            })
            .collect())
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, QdrantError> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("api-key", api_key);
        }
        Ok(req)
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), QdrantError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = QdrantError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Qdrant request failed");
            Err(error)
        }
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn stringify_point_id(id: Value) -> String {
    match id {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordPayload;
    use httpmock::{Method::GET, Method::POST, Method::PUT, MockServer};

    fn service(base_url: &str) -> QdrantService {
        QdrantService::new(base_url, None).expect("client")
    }

    fn record(id: u64, text: &str, hierarchy: &str) -> ChunkRecord {
        ChunkRecord {
            id,
            vector: vec![0.1, 0.2],
            payload: RecordPayload {
                text: text.to_string(),
                hierarchy: hierarchy.to_string(),
                chunk_index: id,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn collection_status_reports_missing_and_ready() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/collections/absent");
                then.status(404).body("not found");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/collections/present");
                then.status(200)
                    .json_body(serde_json::json!({ "result": { "points_count": 42 } }));
            })
            .await;

        let qdrant = service(&server.base_url());
        assert_eq!(
            qdrant.collection_status("absent").await.expect("status"),
            CollectionStatus::Missing
        );
        let status = qdrant.collection_status("present").await.expect("status");
        assert_eq!(status, CollectionStatus::Ready { points_count: 42 });
        assert!(status.has_data());
    }

    #[tokio::test]
    async fn ensure_collection_creates_with_cosine_distance() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/collections/demo");
                then.status(404);
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/collections/demo")
                    .body_contains("Cosine")
                    .body_contains("768");
                then.status(200).json_body(serde_json::json!({ "result": true }));
            })
            .await;

        service(&server.base_url())
            .ensure_collection("demo", 768)
            .await
            .expect("ensure");
        create.assert();
    }

    #[tokio::test]
    async fn upsert_records_uses_ordinal_ids_and_waits() {
        let server = MockServer::start_async().await;
        let upsert = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/collections/demo/points")
                    .query_param("wait", "true")
                    .body_contains("\"id\":0")
                    .body_contains("Permitted Uses");
                then.status(200).json_body(serde_json::json!({ "result": {} }));
            })
            .await;

        let count = service(&server.base_url())
            .upsert_records("demo", &[record(0, "chunk text", "Permitted Uses")])
            .await
            .expect("upsert");
        upsert.assert();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn query_parses_scored_points() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/collections/demo/points/query");
                then.status(200).json_body(serde_json::json!({
                    "result": {
                        "points": [
                            {
                                "id": 3,
                                "score": 0.91,
                                "payload": { "text": "Setbacks text", "hierarchy": "Permitted Uses > Setbacks" }
                            }
                        ]
                    }
                }));
            })
            .await;

        let hits = service(&server.base_url())
            .query("demo", vec![0.1, 0.2], 3)
            .await
            .expect("query");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "3");
        assert!((hits[0].score - 0.91).abs() < f32::EPSILON);
        let payload = hits[0].payload.as_ref().expect("payload");
        assert_eq!(payload["hierarchy"], "Permitted Uses > Setbacks");
    }

    #[tokio::test]
    async fn query_surfaces_missing_collection_as_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/collections/gone/points/query");
                then.status(404).body("collection not found");
            })
            .await;

        let error = service(&server.base_url())
            .query("gone", vec![0.1], 3)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            QdrantError::UnexpectedStatus { status, .. } if status == StatusCode::NOT_FOUND
        ));
    }
}
