//! AI-assisted stream URL extraction
//!
//! Sends a bounded prefix of play page HTML to a chat completion backend,
//! cleans and validates the answer, and retries a fixed number of times
//! with a fixed pause between attempts.

mod normalize;

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::completion::{ChatBackend, ChatRequest, Message};
use crate::error::{Result, ZxyError};

pub use normalize::{
    MANIFEST_MARKER, clean_model_output, is_valid_stream_url, truncate_chars, unescape_slashes,
};

/// Total attempts per extraction
pub const MAX_ATTEMPTS: u32 = 3;
/// Pause between two attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(1);
/// Characters of HTML forwarded to the model
pub const HTML_PREFIX_CHARS: usize = 15_000;

const DEFAULT_MODEL: &str = "deepseek-v3-250324";

const SYSTEM_PROMPT: &str = "You are an expert web scraper. Your task is to extract the primary video stream URL (usually ending in .m3u8) from the given HTML content. Respond ONLY with the URL itself, without any introductory text, explanations, or formatting like backticks or quotes.";

/// Settings for [`StreamUrlExtractor`]
///
/// `Debug` never prints the API key.
#[derive(Clone)]
pub struct ExtractorConfig {
    /// Bearer credential for the completion API; `None` or blank disables extraction
    pub api_key: Option<String>,
    /// Model name sent with every request (default: "deepseek-v3-250324")
    pub model: String,
    /// Completion token cap, a URL is short (default: 500)
    pub max_tokens: u32,
    /// Sampling temperature (default: 0.1)
    pub temperature: f32,
    /// HTML characters forwarded to the model (default: 15000)
    pub html_prefix_chars: usize,
    /// Total attempts (default: 3)
    pub max_attempts: u32,
    /// Fixed pause between attempts (default: 1s)
    pub retry_delay: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 500,
            temperature: 0.1,
            html_prefix_chars: HTML_PREFIX_CHARS,
            max_attempts: MAX_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }
}

impl ExtractorConfig {
    /// Default settings with the given credential
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Configured credential, treating a blank value as absent
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorConfig")
            .field("api_key", &self.credential().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("html_prefix_chars", &self.html_prefix_chars)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

/// Input to one extraction
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    /// Raw play page markup, truncated before sending
    pub html_content: &'a str,
    /// Label used only in logs
    pub title: &'a str,
}

/// Result of a single attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(String),
    Failure(ZxyError),
}

/// One request/response cycle with the backend plus validation
#[derive(Debug)]
pub struct ExtractionAttempt {
    /// 1-based
    pub attempt_number: u32,
    pub max_attempts: u32,
    pub outcome: AttemptOutcome,
}

/// Bounded-retry stream URL extractor
///
/// Holds no per-call state, so one instance serves any number of
/// concurrent extractions.
pub struct StreamUrlExtractor<B> {
    backend: B,
    config: ExtractorConfig,
}

impl<B: ChatBackend> StreamUrlExtractor<B> {
    /// Create an extractor over the given backend
    pub fn new(backend: B, config: ExtractorConfig) -> Self {
        Self { backend, config }
    }

    /// Current settings
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Whether a credential is configured
    pub fn has_credential(&self) -> bool {
        self.config.credential().is_some()
    }

    /// Ask the backend for the stream URL, retrying failed attempts
    ///
    /// # Returns
    /// The cleaned URL with `\/` unescaped
    ///
    /// # Errors
    /// - `MissingCredential` - No API key configured; no request is sent
    /// - `ExhaustedRetries` - Every attempt failed; carries the last failure's
    ///   message and its best-known status (remote status, 504 on timeout, else 500)
    pub async fn extract(&self, request: ExtractionRequest<'_>) -> Result<String> {
        let Some(api_key) = self.config.credential() else {
            error!("AI API key is not configured, refusing to extract");
            return Err(ZxyError::MissingCredential);
        };

        let chat = self.build_chat_request(request.html_content);
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt_number = 1;

        loop {
            let attempt = self
                .run_attempt(api_key, &chat, request.title, attempt_number, max_attempts)
                .await;

            let failure = match attempt.outcome {
                AttemptOutcome::Success(url) => return Ok(url),
                AttemptOutcome::Failure(e) => e,
            };

            warn!(
                attempt = attempt_number,
                max_attempts,
                title = request.title,
                error = %failure,
                "Extraction attempt failed"
            );

            if !failure.is_retryable() {
                return Err(failure);
            }

            if attempt_number >= max_attempts {
                error!(
                    attempts = attempt_number,
                    title = request.title,
                    "All extraction attempts failed"
                );
                return Err(ZxyError::ExhaustedRetries {
                    attempts: attempt_number,
                    status: failure.exhausted_status(),
                    message: failure.to_string(),
                });
            }

            sleep(self.config.retry_delay).await;
            attempt_number += 1;
        }
    }

    /// Perform one backend call and validate its answer
    async fn run_attempt(
        &self,
        api_key: &str,
        chat: &ChatRequest,
        title: &str,
        attempt_number: u32,
        max_attempts: u32,
    ) -> ExtractionAttempt {
        info!(attempt = attempt_number, max_attempts, title, "Analyzing play page");

        let outcome = match self.backend.complete(api_key, chat).await {
            Ok(raw) => {
                debug!(attempt = attempt_number, raw = %raw, "Raw model answer");
                let cleaned = clean_model_output(&raw);
                if is_valid_stream_url(&cleaned) {
                    let url = unescape_slashes(&cleaned);
                    info!(attempt = attempt_number, title, url = %url, "Valid stream URL extracted");
                    AttemptOutcome::Success(url)
                } else {
                    AttemptOutcome::Failure(ZxyError::InvalidStreamUrl(cleaned))
                }
            }
            Err(e) => AttemptOutcome::Failure(e),
        };

        ExtractionAttempt {
            attempt_number,
            max_attempts,
            outcome,
        }
    }

    /// Build the chat request shared by every attempt of one extraction
    pub fn build_chat_request(&self, html_content: &str) -> ChatRequest {
        let html = truncate_chars(html_content, self.config.html_prefix_chars);
        let user_prompt = format!(
            "Extract the video stream URL (e.g., https://.../video.m3u8) from this HTML:\n\n```html\n{}\n```\n\nReturn only the URL.",
            html
        );

        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(user_prompt)],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        }
    }
}
