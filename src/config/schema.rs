//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::layout::input::{InputNode, LayoutData};
use crate::layout::model::DEFAULT_NAMESPACE;

/// Root configuration for the layout server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Layout document and how it is resolved.
    pub layout: LayoutConfig,

    /// Application name to upstream base URL.
    pub applications: BTreeMap<String, String>,

    /// Fragment name to its source.
    pub fragments: BTreeMap<String, FragmentSource>,

    /// Deferred prop retrieval.
    pub props: PropsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum requests handled at once. Further requests wait for a slot.
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Path to the JSON layout file.
    pub path: String,

    /// Prefix of application container ids.
    pub namespace: String,

    /// Unknown router properties are errors instead of warnings.
    pub strict: bool,

    /// Scheme and host used to turn request paths into URLs.
    pub origin: String,

    /// Re-resolve the layout when its file changes.
    pub watch: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            path: "layout.json".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            strict: false,
            origin: "http://localhost".to_string(),
            watch: true,
        }
    }
}

/// Where a fragment's markup comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentSource {
    /// Fetched with `GET` on every request.
    Url(String),
    /// Served as-is.
    Inline(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PropsConfig {
    /// Base URL; a prop is fetched from `{url}/{name}`.
    pub url: Option<String>,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed before response headers are sent, in seconds.
    pub request_secs: u64,

    /// Bound on each upstream call, in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// On-disk layout: the host document as a node tree plus its layout data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutFile {
    pub document: Vec<InputNode>,
    #[serde(default)]
    pub data: LayoutData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.layout.namespace, DEFAULT_NAMESPACE);
        assert!(config.applications.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config: ServerConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [layout]
            path = "site/layout.json"
            strict = true

            [applications]
            nav = "http://127.0.0.1:7001"

            [fragments]
            importmap = { inline = "<script type=\"importmap\">{}</script>" }
            banner = { url = "http://127.0.0.1:7002/banner" }

            [props]
            url = "http://127.0.0.1:7003/props"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert!(config.layout.strict);
        assert_eq!(config.applications["nav"], "http://127.0.0.1:7001");
        assert_eq!(
            config.fragments["banner"],
            FragmentSource::Url("http://127.0.0.1:7002/banner".into())
        );
        assert!(matches!(config.fragments["importmap"], FragmentSource::Inline(_)));
        assert_eq!(config.props.url.as_deref(), Some("http://127.0.0.1:7003/props"));
    }
}
