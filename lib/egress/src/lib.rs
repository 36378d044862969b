//! Egress safety for outbound calls made by capabilities.
//!
//! Every request a component, trigger, integration or application sends to
//! its external system goes through an [`EgressContext`]. The context:
//!
//! - **Validates URLs** before sending and before following each redirect
//!   (scheme, host, blocked hostnames, literal private addresses)
//! - **Re-validates at connection time**: a connector layer checks every
//!   destination before it is dialed, literal IPs included, and a guarded DNS
//!   resolver checks every resolved address, so DNS rebinding cannot smuggle
//!   in a private address
//! - **Sends only through the policy**: [`EgressRequest`] has no way to reach
//!   the network except [`EgressContext::execute`]
//! - **Caps redirects** at ten hops
//! - **Caps response size** both from `Content-Length` and while streaming

pub mod config;
pub mod connector;
pub mod context;
pub mod error;
pub mod network;
pub mod policy;
pub mod request;
pub mod resolver;
pub mod response;

pub use config::EgressConfig;
pub use connector::{ConnectGuard, ConnectGuardLayer};
pub use context::{EgressContext, EgressOptions, MAX_REDIRECTS};
pub use error::EgressError;
pub use network::{IpNetwork, ParseNetworkError};
pub use policy::EgressPolicy;
pub use request::EgressRequest;
pub use resolver::{GuardedResolver, SystemResolver};
pub use response::EgressResponse;

/// Re-exported so capability authors can build requests without naming reqwest.
pub use reqwest::{Method, StatusCode};
