//! HTML fetcher for upstream video sites
//!
//! Provides an HTTP client that presents browser-like headers and maps
//! upstream failures to typed errors.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use tracing::{error, info};

use crate::error::{Result, ZxyError};
use crate::sources::Source;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9";

/// Configuration for the site client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 15)
    pub timeout_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
    /// Accept-Language header value (default: "zh-CN,zh;q=0.9,en;q=0.8")
    pub accept_language: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: USER_AGENT.to_string(),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8".to_string(),
        }
    }
}

/// HTTP client for upstream video sites
///
/// Every request carries a desktop browser User-Agent, HTML Accept headers
/// and a `Referer` pointing at the source's home page, since some sites
/// refuse requests without them.
#[derive(Debug, Clone)]
pub struct SiteClient {
    client: reqwest::Client,
}

impl SiteClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        let language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| ZxyError::InvalidConfig(format!("bad Accept-Language: {}", e)))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent)
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(ZxyError::HttpError)?;

        Ok(Self { client })
    }

    /// Fetch HTML from an absolute URL on the given source
    ///
    /// # Arguments
    /// * `source` - The site being fetched, used for `Referer` and error messages
    /// * `url` - Absolute URL built from the source's base URL
    /// * `purpose` - Short label for logs (e.g., "Search", "Play Page")
    ///
    /// # Errors
    /// - `Upstream` - The site answered with a non-2xx status
    /// - `UpstreamUnreachable` - Timeout or connection failure
    /// - `HttpError` - Any other transport or body decoding failure
    pub async fn fetch(&self, source: &Source, url: &str, purpose: &str) -> Result<String> {
        info!(source = %source.name, purpose, url, "Fetching HTML");

        let result = self.do_fetch(source, url).await;
        if let Err(e) = &result {
            error!(source = %source.name, purpose, url, error = %e, "Error fetching HTML");
        }
        result
    }

    async fn do_fetch(&self, source: &Source, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(REFERER, source.referer())
            .send()
            .await
            .map_err(|e| Self::classify(source, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZxyError::Upstream {
                source_name: source.name.clone(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| Self::classify(source, e))
    }

    /// Map a transport error, separating "no response" from everything else
    fn classify(source: &Source, error: reqwest::Error) -> ZxyError {
        if error.is_timeout() || error.is_connect() {
            ZxyError::UpstreamUnreachable(source.name.clone())
        } else {
            ZxyError::HttpError(error)
        }
    }
}
