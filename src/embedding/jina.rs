//! Jina embeddings HTTP client.

use super::{EmbeddingClient, EmbeddingError, EmbeddingTask};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.jina.ai";

/// Client for the Jina `v1/embeddings` endpoint.
pub struct JinaEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    task: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

impl JinaEmbedder {
    /// Construct a client for the hosted endpoint.
    pub fn new(api_key: &str, model: &str, dimension: usize) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, model, dimension)
    }

    /// Construct a client against an explicit base URL (used by tests).
    pub fn with_base_url(base_url: &str, api_key: &str, model: &str, dimension: usize) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            dimension,
        }
    }
}

#[async_trait]
impl EmbeddingClient for JinaEmbedder {
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>, EmbeddingError> {
        let task_hint = match task {
            EmbeddingTask::Document => "retrieval.passage",
            EmbeddingTask::Query => "retrieval.query",
        };
        let body = EmbeddingsRequest {
            model: &self.model,
            task: task_hint,
            input: vec![text],
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::UnexpectedStatus { status, body });
        }

        let payload: EmbeddingsResponse = response.json().await?;
        payload
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| {
                EmbeddingError::MalformedResponse("response contained no embeddings".to_string())
            })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
