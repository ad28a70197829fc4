// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Connection settings for the Typesense client.
//!
//! # Example
//!
//! ```
//! use typesense_sync::TypesenseConfig;
//!
//! // Minimal config (uses defaults)
//! let config = TypesenseConfig::default();
//! assert_eq!(config.base_url(), "http://localhost:8108");
//!
//! // Full config
//! let config = TypesenseConfig {
//!     host: "search.internal".into(),
//!     port: 443,
//!     protocol: "https".into(),
//!     api_key: "xyz".into(),
//!     ..Default::default()
//! };
//! assert_eq!(config.base_url(), "https://search.internal:443");
//! ```

use serde::Deserialize;
use std::time::Duration;

use crate::resilience::retry::RetryConfig;

/// Settings for [`TypesenseClient`](crate::client::TypesenseClient).
///
/// Every field has a default, so a host application can deserialize a
/// partial section of its own config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypesenseConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// "http" or "https"
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Sent as `X-TYPESENSE-API-KEY`
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Backoff for collection retrieval on transport failures
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_host() -> String { "localhost".to_string() }
fn default_port() -> u16 { 8108 }
fn default_protocol() -> String { "http".to_string() }
fn default_connection_timeout_secs() -> u64 { 2 }

impl Default for TypesenseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            protocol: default_protocol(),
            api_key: String::new(),
            connection_timeout_secs: default_connection_timeout_secs(),
            retry: RetryConfig::default(),
        }
    }
}

impl TypesenseConfig {
    /// `{protocol}://{host}:{port}`
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: TypesenseConfig =
            serde_json::from_str(r#"{"api_key": "secret", "port": 9000}"#).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.protocol, "http");
        assert_eq!(config.port, 9000);
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert_eq!(config.retry, RetryConfig::query());
    }

    #[test]
    fn test_empty_config_equals_default() {
        let config: TypesenseConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TypesenseConfig::default());
    }

    #[test]
    fn test_invalid_backoff_factor_rejected_at_load() {
        let json = r#"{
            "api_key": "secret",
            "retry": {"initial_delay": 100, "max_delay": 2000, "factor": -2.0, "max_retries": 3}
        }"#;
        let err = serde_json::from_str::<TypesenseConfig>(json).unwrap_err();
        assert!(err.to_string().contains("backoff factor"));
    }
}
