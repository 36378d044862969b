//! Deserializable egress settings.
//!
//! Loaded by the host process through the `config` crate and converted into
//! [`EgressOptions`]. Omitted fields fall back to the built-in block lists and
//! timeouts.

use crate::context::EgressOptions;
use crate::network::{DEFAULT_BLOCKED_HOSTS, DEFAULT_BLOCKED_NETWORKS, IpNetwork};
use serde::Deserialize;
use std::time::Duration;

/// Egress configuration as it appears in config files and the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// Hostnames blocked by exact or suffix match.
    #[serde(default = "default_blocked_hosts")]
    pub blocked_hosts: Vec<String>,

    /// CIDR ranges blocked for literal and resolved addresses.
    #[serde(default = "default_blocked_networks")]
    pub blocked_networks: Vec<IpNetwork>,

    /// Maximum response body size in bytes. Unlimited when unset.
    #[serde(default)]
    pub max_response_bytes: Option<u64>,

    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Overall per-request deadline in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_idle_timeout_seconds")]
    pub idle_timeout_seconds: u64,
}

fn default_blocked_hosts() -> Vec<String> {
    DEFAULT_BLOCKED_HOSTS.iter().map(|h| (*h).to_string()).collect()
}

fn default_blocked_networks() -> Vec<IpNetwork> {
    DEFAULT_BLOCKED_NETWORKS.to_vec()
}

fn default_connect_timeout_seconds() -> u64 {
    10
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_idle_timeout_seconds() -> u64 {
    90
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self {
            blocked_hosts: default_blocked_hosts(),
            blocked_networks: default_blocked_networks(),
            max_response_bytes: None,
            connect_timeout_seconds: default_connect_timeout_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
            idle_timeout_seconds: default_idle_timeout_seconds(),
        }
    }
}

impl From<EgressConfig> for EgressOptions {
    fn from(config: EgressConfig) -> Self {
        Self {
            blocked_hosts: config.blocked_hosts,
            blocked_networks: config.blocked_networks,
            max_response_bytes: config.max_response_bytes,
            connect_timeout: Duration::from_secs(config.connect_timeout_seconds),
            timeout: Duration::from_secs(config.request_timeout_seconds),
            pool_idle_timeout: Duration::from_secs(config.idle_timeout_seconds),
            resolver: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: EgressConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config.blocked_hosts, default_blocked_hosts());
        assert_eq!(config.blocked_networks.len(), DEFAULT_BLOCKED_NETWORKS.len());
        assert_eq!(config.max_response_bytes, None);
        assert_eq!(config.request_timeout_seconds, 30);
    }

    #[test]
    fn overrides_parse_cidr_strings() {
        let config: EgressConfig = serde_json::from_str(
            r#"{"blocked_networks": ["10.0.0.0/8"], "max_response_bytes": 1048576}"#,
        )
        .expect("deserialize");
        assert_eq!(config.blocked_networks.len(), 1);

        let options = EgressOptions::from(config);
        assert_eq!(options.max_response_bytes, Some(1_048_576));
        assert_eq!(options.timeout, Duration::from_secs(30));
    }
}
