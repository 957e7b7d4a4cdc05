//! Extraction backends
//!
//! The worker pool only sees the `Extractor` trait. The production backend
//! talks to any OpenAI-compatible `/chat/completions` endpoint.

use crate::analysis::prompt::{build_user_prompt, SYSTEM_PROMPT};
use crate::config::AnalysisConfig;
use crate::model::{BoardId, Post};
use crate::AnalysisError;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Input of one extraction call
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub board_id: BoardId,
    /// Display name of the board, or its id when unmapped
    pub board_name: String,
    pub batch_index: usize,
    pub posts: Vec<Post>,
}

/// Turns a batch of posts into free-form text expected to hold a TSV table
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, request: &BatchRequest) -> Result<String, AnalysisError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Extractor backed by an OpenAI-compatible chat completion API
pub struct ChatCompletionExtractor {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionExtractor {
    /// Creates an extractor with an explicit API key
    ///
    /// # Arguments
    ///
    /// * `config` - The `[analysis]` section
    /// * `api_key` - Bearer token for the endpoint
    pub fn new(config: &AnalysisConfig, api_key: impl Into<String>) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: config.model.clone(),
        })
    }

    /// Creates an extractor reading the API key from `api-key-env`
    pub fn from_env(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AnalysisError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, api_key)
    }

    /// The full completion endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for ChatCompletionExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionExtractor")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl Extractor for ChatCompletionExtractor {
    async fn extract(&self, request: &BatchRequest) -> Result<String, AnalysisError> {
        let user_prompt = build_user_prompt(&request.posts, &request.board_name);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
        };

        tracing::debug!(
            "Requesting extraction for board {} batch {} ({} posts)",
            request.board_id,
            request.batch_index,
            request.posts.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = match serde_json::from_str::<ApiErrorBody>(&error_text) {
                Ok(api_error) => api_error.error.message,
                Err(_) => error_text,
            };
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body: message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AnalysisError::InvalidResponse("response has no message content".to_string()))
    }
}
