//! Error types for the egress crate.
//!
//! Every variant except `InvalidUrl`, `Request` and `Decode` belongs to the
//! "egress blocked" class: the call was refused by policy rather than failing
//! on the wire. Callers decide whether to retry, degrade or propagate.

use std::fmt;
use std::net::IpAddr;

/// Errors from outbound requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EgressError {
    /// The URL could not be parsed.
    InvalidUrl { url: String, reason: String },
    /// Only `http` and `https` are allowed.
    SchemeNotAllowed { scheme: String },
    /// The URL has no host component.
    MissingHost { url: String },
    /// The hostname matches the blocked set.
    BlockedHost { host: String },
    /// The address is in a private or reserved range.
    BlockedAddress { address: IpAddr },
    /// The redirect chain exceeded the hop limit.
    TooManyRedirects { limit: usize },
    /// The response body exceeded the configured maximum.
    ResponseTooLarge {
        limit: u64,
        /// The `Content-Length` the server declared, when the check fired before reading.
        declared: Option<u64>,
    },
    /// The HTTP client could not be constructed.
    ClientBuild { reason: String },
    /// Transport-level failure (connect, TLS, timeout, body read).
    Request { reason: String },
    /// The response body was not valid for the requested decoding.
    Decode { reason: String },
}

impl EgressError {
    /// Returns true when the request was refused by egress policy.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            Self::SchemeNotAllowed { .. }
                | Self::MissingHost { .. }
                | Self::BlockedHost { .. }
                | Self::BlockedAddress { .. }
                | Self::TooManyRedirects { .. }
                | Self::ResponseTooLarge { .. }
        )
    }

    /// The HTTP status a transport answers with when this error ends a call
    /// made on behalf of a client.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidUrl { .. } => 400,
            Self::ResponseTooLarge { .. } => 502,
            _ if self.is_blocked() => 403,
            Self::Request { .. } | Self::Decode { .. } => 502,
            _ => 500,
        }
    }

    /// Recovers the policy error that caused a reqwest failure.
    ///
    /// Redirect-policy and resolver errors surface from reqwest wrapped in
    /// several layers; this walks the source chain looking for ours.
    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        let mut source: Option<&(dyn std::error::Error + 'static)> =
            Some(err as &(dyn std::error::Error + 'static));
        while let Some(current) = source {
            if let Some(egress) = current.downcast_ref::<EgressError>() {
                return egress.clone();
            }
            source = current.source();
        }
        Self::Request {
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for EgressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { url, reason } => write!(f, "invalid url '{url}': {reason}"),
            Self::SchemeNotAllowed { scheme } => {
                write!(f, "scheme '{scheme}' is not allowed, only http and https")
            }
            Self::MissingHost { url } => write!(f, "url '{url}' has no host"),
            Self::BlockedHost { host } => write!(f, "host '{host}' is blocked"),
            Self::BlockedAddress { address } => {
                write!(f, "address {address} is in a blocked network")
            }
            Self::TooManyRedirects { limit } => write!(f, "stopped after {limit} redirects"),
            Self::ResponseTooLarge { limit, declared } => match declared {
                Some(declared) => write!(
                    f,
                    "response content length {declared} exceeds maximum of {limit} bytes"
                ),
                None => write!(f, "response body exceeds maximum of {limit} bytes"),
            },
            Self::ClientBuild { reason } => write!(f, "failed to build http client: {reason}"),
            Self::Request { reason } => write!(f, "request failed: {reason}"),
            Self::Decode { reason } => write!(f, "failed to decode response: {reason}"),
        }
    }
}

impl std::error::Error for EgressError {}
