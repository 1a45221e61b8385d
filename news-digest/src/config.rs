//! Digest configuration with sensible defaults.

use crate::error::NewsError;
use crate::types::SourceKind;

/// Configuration for a digest run.
#[derive(Debug, Clone)]
pub struct NewsConfig {
    /// Sources to query, in report order. Queried one after another.
    pub sources: Vec<SourceKind>,
    /// Maximum items kept per source.
    pub limit: usize,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Pause between two source requests, in milliseconds.
    pub request_delay_ms: u64,
    /// Custom User-Agent string. If `None`, one is picked from a built-in
    /// list of browser User-Agents.
    pub user_agent: Option<String>,
    /// Zhihu API base URL.
    pub zhihu_base: String,
    /// Weibo API base URL.
    pub weibo_base: String,
    /// 36Kr API base URL.
    pub kr36_base: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            sources: SourceKind::all().to_vec(),
            limit: 10,
            timeout_seconds: 10,
            request_delay_ms: 1000,
            user_agent: None,
            zhihu_base: "https://www.zhihu.com".to_owned(),
            weibo_base: "https://weibo.com".to_owned(),
            kr36_base: "https://36kr.com".to_owned(),
        }
    }
}

impl NewsConfig {
    /// Point every source at `base`, for tests against a local server.
    pub fn with_base_url(mut self, base: &str) -> Self {
        self.zhihu_base = base.to_owned();
        self.weibo_base = base.to_owned();
        self.kr36_base = base.to_owned();
        self
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), NewsError> {
        if self.limit == 0 {
            return Err(NewsError::Config("limit must be greater than 0".into()));
        }
        if self.timeout_seconds == 0 {
            return Err(NewsError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.sources.is_empty() {
            return Err(NewsError::Config(
                "at least one source must be enabled".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = NewsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.limit, 10);
        assert_eq!(config.request_delay_ms, 1000);
        assert_eq!(config.sources, SourceKind::all());
    }

    #[test]
    fn zero_limit_rejected() {
        let config = NewsConfig {
            limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_sources_rejected() {
        let config = NewsConfig {
            sources: vec![],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least one source"));
    }

    #[test]
    fn base_url_override_applies_to_all_sources() {
        let config = NewsConfig::default().with_base_url("http://127.0.0.1:1");
        assert_eq!(config.zhihu_base, "http://127.0.0.1:1");
        assert_eq!(config.weibo_base, "http://127.0.0.1:1");
        assert_eq!(config.kr36_base, "http://127.0.0.1:1");
    }
}
