//! ZXY Multi-Source Proxy Core Library
//!
//! Provides async API for proxying searches and play pages from a fixed set
//! of video sites, and for resolving a play page to its `.m3u8` stream URL
//! with the help of a chat completion model.
//!
//! # Overview
//!
//! - Source registry with search/play URL builders
//! - HTML fetcher presenting browser-like headers
//! - Stream URL extractor with bounded, fixed-delay retries
//! - High-level [`ZxyProxy`] combining the above
//!
//! # Example
//!
//! ```no_run
//! use zxy_core::{
//!     ClientConfig, CompletionConfig, ExtractorConfig, Result, SourceId, SourceRegistry, ZxyProxy,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let proxy = ZxyProxy::new(
//!         SourceRegistry::default(),
//!         ClientConfig::default(),
//!         CompletionConfig::default(),
//!         ExtractorConfig::with_api_key(std::env::var("AI_API_KEY").unwrap_or_default()),
//!     )?;
//!
//!     // Raw search results HTML
//!     let html = proxy.search(SourceId::Original, Some("one piece")).await?;
//!     println!("{} bytes", html.len());
//!
//!     // Direct stream URL for a play page
//!     let url = proxy
//!         .stream_url(Some("original"), Some("/vodplay/12345-1-1.html"), Some("One Piece"))
//!         .await?;
//!     println!("Stream URL: {}", url);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Stream URLs
//!
//! Only answers that start with `http` or `/` and contain `.m3u8` are
//! accepted. Root-relative answers are returned as-is; resolving them
//! against the play page host is up to the caller.

mod client;
pub mod completion;
mod error;
pub mod extractor;
mod proxy;
pub mod sources;

// Re-export client types
pub use client::{ClientConfig, SiteClient};

// Re-export completion types
pub use completion::{ChatBackend, ChatRequest, CompletionClient, CompletionConfig, Message};

// Re-export error types
pub use error::{Result, ZxyError};

// Re-export extractor API
pub use extractor::{ExtractionRequest, ExtractorConfig, StreamUrlExtractor};

// Re-export main proxy API
pub use proxy::{UNKNOWN_TITLE, ZxyProxy};

// Re-export source helpers for convenience
pub use sources::{Source, SourceId, SourceRegistry, validate_play_path};
