//! CLI configuration.
//!
//! Loaded via the `config` crate from an optional file plus environment
//! variables prefixed with `SWITCHYARD__`, using `__` as the nesting
//! separator (`SWITCHYARD__EGRESS__MAX_RESPONSE_BYTES=1048576`). The
//! environment wins over the file.

use crate::error::CliError;
use rootcause::Report;
use serde::Deserialize;
use std::path::Path;
use switchyard_egress::EgressConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log: String,

    #[serde(default)]
    pub egress: EgressConfig,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log: default_log_filter(),
            egress: EgressConfig::default(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from `file`, if given, then the environment.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` if the file cannot be read or a value has
    /// the wrong shape.
    pub fn load(file: Option<&Path>) -> Result<Self, Report<CliError>> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix("SWITCHYARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| {
                CliError::Config {
                    reason: e.to_string(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_sources() {
        let config = CliConfig::default();
        assert_eq!(config.log, "info");
        assert_eq!(config.egress.request_timeout_seconds, 30);
        assert!(config.egress.max_response_bytes.is_none());
    }

    #[test]
    fn loads_file_and_fills_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "log = \"debug\"\n\n[egress]\nmax_response_bytes = 4096\n\
             blocked_hosts = [\"internal.example\"]"
        )
        .unwrap();

        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.log, "debug");
        assert_eq!(config.egress.max_response_bytes, Some(4096));
        assert_eq!(config.egress.blocked_hosts, ["internal.example"]);
        assert_eq!(config.egress.connect_timeout_seconds, 10);
        assert!(!config.egress.blocked_networks.is_empty());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err.current_context(), CliError::Config { .. }));
    }

    #[test]
    fn malformed_value_is_a_config_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[egress]\nmax_response_bytes = \"lots\"").unwrap();

        let err = CliConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err.current_context(), CliError::Config { reason } if !reason.is_empty()));
    }
}
