//! Chat completion client
//!
//! Request/response types for an OpenAI-compatible `/chat/completions`
//! endpoint and the [`ChatBackend`] seam the extractor talks through.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ZxyError};

const DEFAULT_ENDPOINT: &str = "https://ark.cn-beijing.volces.com/api/v3/chat/completions";

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user", "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Always false, the extractor needs the whole answer at once
    pub stream: bool,
}

/// Raw chat response, every level optional so missing fields surface as
/// [`ZxyError::MalformedResponse`] instead of a decode error.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseRaw {
    pub choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatMessageResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatMessageResponse {
    pub content: Option<String>,
}

impl ChatResponseRaw {
    /// Content of the first choice, if present and non-empty
    pub(crate) fn into_content(self) -> Result<String> {
        self.choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ZxyError::MalformedResponse("no message content in response".into()))
    }
}

/// Something that can answer a chat completion request
///
/// Implemented by [`CompletionClient`] for real traffic; tests substitute
/// scripted backends.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one request and return the first choice's message content
    ///
    /// # Errors
    /// - `Transport` - Network failure or timeout
    /// - `CompletionStatus` - Non-2xx answer
    /// - `MalformedResponse` - Answer without message content
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String>;
}

/// Configuration for the completion client
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Full URL of the chat completions endpoint
    pub endpoint: String,
    /// Per-request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

/// reqwest-backed client for an OpenAI-compatible chat endpoint
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl CompletionClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(CompletionConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: CompletionConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ZxyError::HttpError)?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint,
        })
    }

    /// Endpoint requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn transport_error(e: reqwest::Error) -> ZxyError {
    ZxyError::Transport {
        timed_out: e.is_timeout(),
        message: e.to_string(),
    }
}

#[async_trait]
impl ChatBackend for CompletionClient {
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String> {
        debug!(model = %request.model, endpoint = %self.endpoint, "Sending chat completion request");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ZxyError::CompletionStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(transport_error)?;
        let raw: ChatResponseRaw = serde_json::from_str(&body)
            .map_err(|e| ZxyError::MalformedResponse(format!("undecodable body: {}", e)))?;
        raw.into_content()
    }
}
