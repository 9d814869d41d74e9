//! Data source configuration.

use gqlds_core::Headers;
use gqlds_link::Url;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use crate::error::ConfigError;

/// Data source configuration.
///
/// Hosts can build it fluently or deserialize it from their own config:
///
/// ```
/// use gqlds_sdk::DataSourceConfig;
///
/// let config: DataSourceConfig = serde_json::from_str(
///     r#"{"base_url": "https://users.internal/graphql", "timeout_ms": 2000}"#,
/// ).unwrap();
/// assert_eq!(config.timeout.as_millis(), 2000);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSourceConfig {
    /// GraphQL endpoint of the upstream service.
    pub base_url: Option<String>,
    /// Request timeout.
    #[serde(rename = "timeout_ms", deserialize_with = "millis")]
    pub timeout: Duration,
    /// Headers sent with every request.
    pub headers: Headers,
    /// Serve queries from a normalized response cache.
    pub use_normalized_cache: bool,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            headers: Headers::new(),
            use_normalized_cache: false,
        }
    }
}

impl DataSourceConfig {
    /// Creates a new config with a base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Default::default()
        }
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a default header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Enables or disables the normalized cache.
    pub fn normalized_cache(mut self, enabled: bool) -> Self {
        self.use_normalized_cache = enabled;
        self
    }

    /// Validates and returns the base URL.
    pub fn resolve_url(&self) -> Result<Url, ConfigError> {
        let raw = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;

        Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
