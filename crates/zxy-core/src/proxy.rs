//! Main proxy API
//!
//! Combines the site client, the source registry and the stream URL
//! extractor behind the three operations the HTTP layer exposes.

use tracing::info;

use crate::client::{ClientConfig, SiteClient};
use crate::completion::{ChatBackend, CompletionClient, CompletionConfig};
use crate::error::{Result, ZxyError};
use crate::extractor::{ExtractionRequest, ExtractorConfig, StreamUrlExtractor};
use crate::sources::{SourceId, SourceRegistry, validate_play_path};

/// Title used in logs when the caller gives none
pub const UNKNOWN_TITLE: &str = "Unknown Video";

/// Multi-source video proxy
///
/// All methods take `&self` and keep no per-request state, so one instance
/// can be shared behind an `Arc` by any number of concurrent handlers.
pub struct ZxyProxy<B = CompletionClient> {
    sources: SourceRegistry,
    client: SiteClient,
    extractor: StreamUrlExtractor<B>,
}

impl ZxyProxy<CompletionClient> {
    /// Create a proxy talking to the real completion endpoint
    ///
    /// # Errors
    /// Returns error if either HTTP client fails to initialize
    pub fn new(
        sources: SourceRegistry,
        client_config: ClientConfig,
        completion_config: CompletionConfig,
        extractor_config: ExtractorConfig,
    ) -> Result<Self> {
        let backend = CompletionClient::with_config(completion_config)?;
        Self::with_backend(sources, client_config, backend, extractor_config)
    }
}

impl<B: ChatBackend> ZxyProxy<B> {
    /// Create a proxy over a custom completion backend
    ///
    /// # Errors
    /// Returns error if the site client fails to initialize
    pub fn with_backend(
        sources: SourceRegistry,
        client_config: ClientConfig,
        backend: B,
        extractor_config: ExtractorConfig,
    ) -> Result<Self> {
        Ok(Self {
            sources,
            client: SiteClient::with_config(client_config)?,
            extractor: StreamUrlExtractor::new(backend, extractor_config),
        })
    }

    /// Configured sources
    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Whether stream extraction has a credential to work with
    pub fn can_extract(&self) -> bool {
        self.extractor.has_credential()
    }

    /// Fetch a source's search results page
    ///
    /// # Arguments
    /// * `source_id` - Site to search
    /// * `query` - Search query, trimmed before encoding
    ///
    /// # Returns
    /// Raw search results HTML, parsed by the browser client
    ///
    /// # Errors
    /// - `MissingQuery` if the query is absent or blank
    /// - `Upstream` / `UpstreamUnreachable` / `HttpError` from the fetch
    pub async fn search(&self, source_id: SourceId, query: Option<&str>) -> Result<String> {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or(ZxyError::MissingQuery)?;

        let source = self.sources.get(source_id);
        let url = source.search_url(query);
        self.client.fetch(source, &url, "Search").await
    }

    /// Fetch a play page
    ///
    /// # Arguments
    /// * `source` - Raw source parameter (e.g., "original")
    /// * `path` - Root-relative play page path (e.g., "/vodplay/123-1-1.html")
    ///
    /// # Errors
    /// - `UnknownSource` / `InvalidPath` for bad parameters
    /// - `Upstream` / `UpstreamUnreachable` / `HttpError` from the fetch
    pub async fn play_page(&self, source: Option<&str>, path: Option<&str>) -> Result<String> {
        let source = self.sources.resolve(source)?;
        let path = validate_play_path(path)?;

        let url = source.play_url(path);
        self.client.fetch(source, &url, "Play Page").await
    }

    /// Resolve a play page to its direct stream URL
    ///
    /// Validates the parameters and the credential before any network
    /// traffic, fetches the play page and hands it to the extractor.
    ///
    /// # Arguments
    /// * `source` - Raw source parameter
    /// * `path` - Root-relative play page path
    /// * `title` - Display title for logs, defaults to [`UNKNOWN_TITLE`]
    ///
    /// # Errors
    /// - `UnknownSource` / `InvalidPath` for bad parameters
    /// - `MissingCredential` if no API key is configured
    /// - fetch errors for the play page
    /// - `ExhaustedRetries` if the model never produced a valid URL
    pub async fn stream_url(
        &self,
        source: Option<&str>,
        path: Option<&str>,
        title: Option<&str>,
    ) -> Result<String> {
        let source = self.sources.resolve(source)?;
        let path = validate_play_path(path)?;
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN_TITLE);

        if !self.extractor.has_credential() {
            return Err(ZxyError::MissingCredential);
        }

        let url = source.play_url(path);
        let html = self
            .client
            .fetch(source, &url, "Play Page for AI")
            .await?;
        info!(title, length = html.len(), "Fetched play page for analysis");

        self.extractor
            .extract(ExtractionRequest {
                html_content: &html,
                title,
            })
            .await
    }
}
