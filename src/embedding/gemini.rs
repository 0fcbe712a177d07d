//! Gemini `embedContent` HTTP client.

use super::{EmbeddingClient, EmbeddingError, EmbeddingTask};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Client for the Google Generative Language embedding endpoint.
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    content: Content<'a>,
    #[serde(rename = "taskType")]
    task_type: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GeminiEmbedder {
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
impl EmbeddingClient for GeminiEmbedder {
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>, EmbeddingError> {
        let task_type = match task {
            EmbeddingTask::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingTask::Query => "RETRIEVAL_QUERY",
        };
        let url = format!(
            "{}/v1beta/models/{}:embedContent",
            self.base_url, self.model
        );
        let body = EmbedContentRequest {
            content: Content {
                parts: vec![Part { text }],
            },
            task_type,
        };

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::UnexpectedStatus { status, body });
        }

        let payload: EmbedContentResponse = response.json().await?;
        if payload.embedding.values.is_empty() {
            return Err(EmbeddingError::MalformedResponse(
                "embedding values were empty".to_string(),
            ));
        }
        Ok(payload.embedding.values)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
