//! URL and address validation shared by every egress check.

use crate::error::EgressError;
use crate::network::{self, IpNetwork};
use std::net::IpAddr;
use url::{Host, Url};

/// The blocked hostname and network sets for one egress context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgressPolicy {
    blocked_hosts: Vec<String>,
    blocked_networks: Vec<IpNetwork>,
}

impl EgressPolicy {
    /// Creates a policy. Hostnames are compared case-insensitively.
    #[must_use]
    pub fn new(
        blocked_hosts: impl IntoIterator<Item = impl Into<String>>,
        blocked_networks: impl IntoIterator<Item = IpNetwork>,
    ) -> Self {
        Self {
            blocked_hosts: blocked_hosts
                .into_iter()
                .map(|host| normalize_host(&host.into()))
                .filter(|host| !host.is_empty())
                .collect(),
            blocked_networks: blocked_networks.into_iter().collect(),
        }
    }

    /// Runs the full pre-request pipeline: scheme, host presence, blocked
    /// hostname, then literal IP.
    ///
    /// # Errors
    ///
    /// Returns the first check that fails.
    pub fn check_url(&self, url: &Url) -> Result<(), EgressError> {
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(EgressError::SchemeNotAllowed {
                    scheme: other.to_string(),
                });
            }
        }

        let missing = || EgressError::MissingHost {
            url: url.to_string(),
        };
        match url.host().ok_or_else(missing)? {
            Host::Domain(domain) => {
                if domain.is_empty() {
                    return Err(missing());
                }
                self.check_host(domain)
            }
            Host::Ipv4(v4) => {
                self.check_host(&v4.to_string())?;
                self.check_ip(IpAddr::V4(v4))
            }
            Host::Ipv6(v6) => {
                self.check_host(&v6.to_string())?;
                self.check_ip(IpAddr::V6(v6))
            }
        }
    }

    /// Checks a hostname against the blocked set by exact or `.`-bounded
    /// suffix match.
    ///
    /// # Errors
    ///
    /// Returns `BlockedHost` on a match.
    pub fn check_host(&self, host: &str) -> Result<(), EgressError> {
        let host = normalize_host(host);
        let blocked = self.blocked_hosts.iter().any(|entry| {
            host.strip_suffix(entry.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.ends_with('.'))
        });
        if blocked {
            return Err(EgressError::BlockedHost { host });
        }
        Ok(())
    }

    /// Checks an address against the blocked networks.
    ///
    /// This runs on the connect path: no allocation beyond the error, no DNS.
    ///
    /// # Errors
    ///
    /// Returns `BlockedAddress` if the address is private or reserved.
    pub fn check_ip(&self, address: IpAddr) -> Result<(), EgressError> {
        let address = network::normalize(address);
        if self
            .blocked_networks
            .iter()
            .any(|network| network.contains(address))
        {
            return Err(EgressError::BlockedAddress { address });
        }
        Ok(())
    }
}

impl Default for EgressPolicy {
    fn default() -> Self {
        Self::new(
            network::DEFAULT_BLOCKED_HOSTS.iter().copied(),
            network::DEFAULT_BLOCKED_NETWORKS.iter().copied(),
        )
    }
}

fn normalize_host(host: &str) -> String {
    host.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('.')
        .to_ascii_lowercase()
}
