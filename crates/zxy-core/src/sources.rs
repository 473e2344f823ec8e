//! Upstream video site registry
//!
//! Provides the fixed set of supported sources and the helpers for building
//! their search and play page URLs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZxyError};

const ORIGINAL_BASE_URL: &str = "https://www.pkcom.cc";
const FSYUYOU_BASE_URL: &str = "https://www.fsyuyou.com";

/// Identifier of a configured upstream site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// pkcom.cc
    Original,
    /// fsyuyou.com
    Fsyuyou,
}

impl SourceId {
    /// All known sources, in registry order
    pub const ALL: [SourceId; 2] = [SourceId::Original, SourceId::Fsyuyou];

    /// Query-string spelling of the identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Original => "original",
            SourceId::Fsyuyou => "fsyuyou",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = ZxyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "original" => Ok(SourceId::Original),
            "fsyuyou" => Ok(SourceId::Fsyuyou),
            other => Err(ZxyError::UnknownSource(other.to_string())),
        }
    }
}

/// A single upstream video site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Registry key
    pub id: SourceId,
    /// Human-readable name used in logs and error messages
    pub name: String,
    /// Scheme and host without trailing slash (e.g., "https://www.pkcom.cc")
    pub base_url: String,
}

impl Source {
    /// Builds the site-relative search path for a query
    ///
    /// # Example
    /// ```
    /// use zxy_core::{SourceId, SourceRegistry};
    /// let registry = SourceRegistry::default();
    /// let source = registry.get(SourceId::Fsyuyou);
    /// assert_eq!(source.search_path("海贼王"), "/fqsiso/-------------.html?wd=%E6%B5%B7%E8%B4%BC%E7%8E%8B");
    /// ```
    pub fn search_path(&self, query: &str) -> String {
        let encoded = urlencoding::encode(query);
        match self.id {
            SourceId::Original => format!("/vodsearch/{}-------------.html", encoded),
            SourceId::Fsyuyou => format!("/fqsiso/-------------.html?wd={}", encoded),
        }
    }

    /// Builds the absolute search URL for a query
    pub fn search_url(&self, query: &str) -> String {
        format!("{}{}", self.base_url, self.search_path(query))
    }

    /// Builds the absolute play page URL for a validated path
    ///
    /// # Example
    /// ```
    /// use zxy_core::{SourceId, SourceRegistry};
    /// let registry = SourceRegistry::default();
    /// let url = registry.get(SourceId::Original).play_url("/vodplay/123-1-1.html");
    /// assert_eq!(url, "https://www.pkcom.cc/vodplay/123-1-1.html");
    /// ```
    pub fn play_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Value for the `Referer` header when fetching from this site
    pub fn referer(&self) -> String {
        format!("{}/", self.base_url)
    }
}

/// The configured set of upstream sites
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    original: Source,
    fsyuyou: Source,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self {
            original: Source {
                id: SourceId::Original,
                name: "Original Source (pkcom.cc)".to_string(),
                base_url: ORIGINAL_BASE_URL.to_string(),
            },
            fsyuyou: Source {
                id: SourceId::Fsyuyou,
                name: "Fsyuyou Source".to_string(),
                base_url: FSYUYOU_BASE_URL.to_string(),
            },
        }
    }
}

impl SourceRegistry {
    /// Replaces the base URL of one source (mirrors, local test servers)
    ///
    /// A trailing slash is dropped so paths can be appended directly.
    pub fn with_base_url(mut self, id: SourceId, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        match id {
            SourceId::Original => self.original.base_url = base_url,
            SourceId::Fsyuyou => self.fsyuyou.base_url = base_url,
        }
        self
    }

    /// Looks up a source by id
    pub fn get(&self, id: SourceId) -> &Source {
        match id {
            SourceId::Original => &self.original,
            SourceId::Fsyuyou => &self.fsyuyou,
        }
    }

    /// Resolves a raw source parameter, rejecting missing or unknown ids
    pub fn resolve(&self, raw: Option<&str>) -> Result<&Source> {
        let raw = raw.ok_or_else(|| ZxyError::UnknownSource(String::new()))?;
        Ok(self.get(raw.parse()?))
    }

    /// Iterates over all sources
    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        SourceId::ALL.into_iter().map(|id| self.get(id))
    }
}

/// Validates a play page path
///
/// The path must be present and root-relative (start with `/`).
///
/// # Example
/// ```
/// use zxy_core::validate_play_path;
/// assert!(validate_play_path(Some("/vodplay/1-1-1.html")).is_ok());
/// assert!(validate_play_path(Some("vodplay/1-1-1.html")).is_err());
/// assert!(validate_play_path(None).is_err());
/// ```
pub fn validate_play_path(path: Option<&str>) -> Result<&str> {
    match path {
        Some(p) if p.starts_with('/') => Ok(p),
        Some(p) => Err(ZxyError::InvalidPath(p.to_string())),
        None => Err(ZxyError::InvalidPath(String::new())),
    }
}
