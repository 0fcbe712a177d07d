//! OpenAI-compatible chat completions client.

use crate::config::{Config, ConfigError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the chat completion endpoint.
#[derive(Debug, Error)]
pub enum ChatError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Endpoint responded with an unexpected status code.
    #[error("Unexpected chat response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the endpoint.
        status: reqwest::StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Endpoint returned no choices or empty content.
    #[error("Chat endpoint returned no content")]
    EmptyResponse,
}

/// Interface for chat completion backends.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Run one system+user exchange and return the assistant's reply text.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ChatError>;
}

/// Chat client speaking the OpenAI chat-completions dialect.
///
/// The Gemini models are reachable through Google's OpenAI-compatible
/// endpoint, which is the default base URL.
pub struct OpenAiCompatChat {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

impl OpenAiCompatChat {
    /// Construct a client for an explicit endpoint.
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Construct a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            &config.chat_base_url,
            config.require_google_api_key()?,
            &config.chat_model,
        ))
    }
}

#[async_trait]
impl ChatClient for OpenAiCompatChat {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ChatError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::UnexpectedStatus { status, body });
        }

        let payload: ChatResponse = response.json().await?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ChatError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    #[tokio::test]
    async fn complete_sends_messages_and_returns_first_choice() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer chat-key")
                    .body_contains("gemini-2.0-flash")
                    .body_contains("height limits");
                then.status(200).json_body(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "The limit is 4 metres." } }
                    ]
                }));
            })
            .await;

        let chat = OpenAiCompatChat::new(&server.base_url(), "chat-key", "gemini-2.0-flash");
        let reply = chat
            .complete("You are a zoning assistant.", "height limits")
            .await
            .expect("reply");

        mock.assert();
        assert_eq!(reply, "The limit is 4 metres.");
    }

    #[tokio::test]
    async fn empty_choices_surface_as_empty_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let chat = OpenAiCompatChat::new(&server.base_url(), "chat-key", "gemini-2.0-flash");
        let error = chat.complete("system", "user").await.unwrap_err();
        assert!(matches!(error, ChatError::EmptyResponse));
    }
}
