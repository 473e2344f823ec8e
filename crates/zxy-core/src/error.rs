//! Error types for the zxy proxy
//!
//! Provides one error enum for fetching, extraction and request validation,
//! with HTTP status mapping and string serialization.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for all zxy proxy operations
///
/// Implements Display for human-readable messages and Serialize
/// so handlers can embed it directly in JSON bodies.
#[derive(Error, Debug)]
pub enum ZxyError {
    /// HTTP request failed for a reason other than status or reachability
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Source identifier is missing or not configured
    #[error("Invalid or missing source parameter: {0:?}")]
    UnknownSource(String),

    /// Play page path is missing or not root-relative
    #[error("Invalid or missing play page path: {0:?}")]
    InvalidPath(String),

    /// Search query is missing or blank
    #[error("Missing search query")]
    MissingQuery,

    /// Upstream video site answered with a non-success status
    #[error("Error from {source_name} server: {status}")]
    Upstream { source_name: String, status: u16 },

    /// Upstream video site did not answer (timeout or network issue)
    #[error("No response received from {0} server (Timeout or Network Issue)")]
    UpstreamUnreachable(String),

    /// Client or extractor settings are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Completion API credential is not configured
    #[error("AI API key is missing in server configuration")]
    MissingCredential,

    /// Completion API could not be reached or timed out
    #[error("Completion request failed: {message}")]
    Transport { message: String, timed_out: bool },

    /// Completion API answered with a non-success status
    #[error("Completion API returned status {status}: {body}")]
    CompletionStatus { status: u16, body: String },

    /// Completion API answered without the expected message content
    #[error("AI returned invalid data structure: {0}")]
    MalformedResponse(String),

    /// Model output is not a usable .m3u8 URL
    #[error("AI failed to extract a valid .m3u8 link: {0:?}")]
    InvalidStreamUrl(String),

    /// Every extraction attempt failed
    #[error("AI analysis failed after {attempts} attempts: {message}")]
    ExhaustedRetries {
        attempts: u32,
        status: u16,
        message: String,
    },
}

impl ZxyError {
    /// HTTP status code a handler should answer with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnknownSource(_) | Self::InvalidPath(_) | Self::MissingQuery => 400,
            Self::MissingCredential | Self::InvalidConfig(_) => 500,
            Self::Upstream { status, .. } => *status,
            Self::UpstreamUnreachable(_) => 504,
            Self::Transport { timed_out: true, .. } => 504,
            Self::CompletionStatus { status, .. } => *status,
            Self::ExhaustedRetries { status, .. } => *status,
            Self::HttpError(_)
            | Self::Transport { .. }
            | Self::MalformedResponse(_)
            | Self::InvalidStreamUrl(_) => 502,
        }
    }

    /// Whether an extraction attempt that failed with this error may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::CompletionStatus { .. }
                | Self::MalformedResponse(_)
                | Self::InvalidStreamUrl(_)
                | Self::HttpError(_)
        )
    }

    /// Status to surface once retries are exhausted with this as the last failure
    ///
    /// The remote HTTP status wins when present, a timeout maps to 504 and
    /// anything else falls back to 500.
    pub(crate) fn exhausted_status(&self) -> u16 {
        match self {
            Self::CompletionStatus { status, .. } => *status,
            Self::Transport { timed_out: true, .. } => 504,
            // CompletionClient never yields HttpError; custom backends may
            Self::HttpError(e) if e.is_timeout() => 504,
            Self::HttpError(e) => e.status().map(|s| s.as_u16()).unwrap_or(500),
            _ => 500,
        }
    }
}

impl Serialize for ZxyError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for zxy operations
pub type Result<T> = std::result::Result<T, ZxyError>;
