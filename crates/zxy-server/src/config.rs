//! Server configuration loaded from the environment

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use zxy_core::{
    ClientConfig, CompletionConfig, ExtractorConfig, SourceId, SourceRegistry, ZxyProxy,
};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Everything the binary needs to start
#[derive(Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// `AI_API_KEY`; absence only fails stream URL requests
    pub ai_api_key: Option<String>,
    pub ai_api_url: Option<String>,
    pub ai_model: Option<String>,
    pub ai_timeout: Option<Duration>,
    pub original_base_url: Option<String>,
    pub fsyuyou_base_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = match value("HOST") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("HOST must be an IP address, got {:?}", raw))?,
            None => DEFAULT_HOST,
        };
        let port = match value("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a valid number, got {:?}", raw))?,
            None => DEFAULT_PORT,
        };
        let ai_timeout = value("AI_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("AI_TIMEOUT_SECS must be a number, got {:?}", raw))
            })
            .transpose()?;

        Ok(Self {
            host,
            port,
            ai_api_key: value("AI_API_KEY"),
            ai_api_url: value("AI_API_URL"),
            ai_model: value("AI_MODEL"),
            ai_timeout,
            original_base_url: value("ZXY_ORIGINAL_BASE_URL"),
            fsyuyou_base_url: value("ZXY_FSYUYOU_BASE_URL"),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn sources(&self) -> SourceRegistry {
        let mut sources = SourceRegistry::default();
        if let Some(url) = &self.original_base_url {
            sources = sources.with_base_url(SourceId::Original, url.as_str());
        }
        if let Some(url) = &self.fsyuyou_base_url {
            sources = sources.with_base_url(SourceId::Fsyuyou, url.as_str());
        }
        sources
    }

    pub fn completion_config(&self) -> CompletionConfig {
        let defaults = CompletionConfig::default();
        CompletionConfig {
            endpoint: self.ai_api_url.clone().unwrap_or(defaults.endpoint),
            timeout: self.ai_timeout.unwrap_or(defaults.timeout),
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        let defaults = ExtractorConfig::default();
        ExtractorConfig {
            api_key: self.ai_api_key.clone(),
            model: self.ai_model.clone().unwrap_or(defaults.model.clone()),
            ..defaults
        }
    }

    /// Assemble the proxy these settings describe
    pub fn build_proxy(&self) -> zxy_core::Result<ZxyProxy> {
        ZxyProxy::new(
            self.sources(),
            ClientConfig::default(),
            self.completion_config(),
            self.extractor_config(),
        )
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ai_api_key", &self.ai_api_key.as_ref().map(|_| "<redacted>"))
            .field("ai_api_url", &self.ai_api_url)
            .field("ai_model", &self.ai_model)
            .field("ai_timeout", &self.ai_timeout)
            .field("original_base_url", &self.original_base_url)
            .field("fsyuyou_base_url", &self.fsyuyou_base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.host, DEFAULT_HOST);
        assert!(config.ai_api_key.is_none());
        assert_eq!(
            config.completion_config().endpoint,
            CompletionConfig::default().endpoint
        );
        assert_eq!(config.extractor_config().model, "deepseek-v3-250324");
    }

    #[test]
    fn reads_ai_settings() {
        let config = config_from(&[
            ("AI_API_KEY", "sk-123"),
            ("AI_API_URL", "http://localhost:8000/v1/chat/completions"),
            ("AI_MODEL", "gpt-4o-mini"),
            ("AI_TIMEOUT_SECS", "45"),
        ])
        .unwrap();

        let extractor = config.extractor_config();
        assert_eq!(extractor.credential(), Some("sk-123"));
        assert_eq!(extractor.model, "gpt-4o-mini");
        assert_eq!(extractor.max_attempts, 3);

        let completion = config.completion_config();
        assert_eq!(completion.endpoint, "http://localhost:8000/v1/chat/completions");
        assert_eq!(completion.timeout, Duration::from_secs(45));
    }

    #[test]
    fn blank_key_is_absent() {
        let config = config_from(&[("AI_API_KEY", "   ")]).unwrap();
        assert!(config.ai_api_key.is_none());
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn invalid_host_is_an_error() {
        assert!(config_from(&[("HOST", "not-an-ip")]).is_err());
    }

    #[test]
    fn base_url_overrides_apply() {
        let config = config_from(&[("ZXY_FSYUYOU_BASE_URL", "http://mirror.local/")]).unwrap();
        let sources = config.sources();
        assert_eq!(sources.get(SourceId::Fsyuyou).base_url, "http://mirror.local");
        assert_eq!(sources.get(SourceId::Original).base_url, "https://www.pkcom.cc");
    }

    #[test]
    fn debug_hides_key() {
        let config = config_from(&[("AI_API_KEY", "sk-secret")]).unwrap();
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
