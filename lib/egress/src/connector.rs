//! Dial-time destination validation.
//!
//! The connector sits below DNS resolution: hostnames reach it before
//! [`GuardedResolver`](crate::resolver::GuardedResolver) has answered, but
//! literal IP hosts never touch the resolver at all. This layer checks every
//! destination handed to the connector, so a literal private address is
//! refused here even when the request never went through
//! [`EgressPolicy::check_url`].

use crate::error::EgressError;
use crate::policy::EgressPolicy;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;
use url::{Host, Url};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Installs a [`ConnectGuard`] in front of the client's connector.
#[derive(Debug, Clone)]
pub struct ConnectGuardLayer {
    policy: Arc<EgressPolicy>,
}

impl ConnectGuardLayer {
    #[must_use]
    pub fn new(policy: Arc<EgressPolicy>) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for ConnectGuardLayer {
    type Service = ConnectGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ConnectGuard {
            inner,
            policy: Arc::clone(&self.policy),
        }
    }
}

/// Refuses to dial destinations the policy blocks.
#[derive(Debug, Clone)]
pub struct ConnectGuard<S> {
    inner: S,
    policy: Arc<EgressPolicy>,
}

impl<S, R> Service<R> for ConnectGuard<S>
where
    S: Service<R, Error = BoxError>,
    S::Response: Send + 'static,
    S::Future: Send + 'static,
    R: fmt::Debug,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, BoxError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, destination: R) -> Self::Future {
        match check_destination(&self.policy, &destination) {
            Ok(()) => Box::pin(self.inner.call(destination)),
            Err(err) => {
                warn!(destination = ?destination, error = %err, "blocked connection");
                Box::pin(std::future::ready(Err(Box::new(err) as BoxError)))
            }
        }
    }
}

/// Checks the host of a connector destination.
///
/// reqwest keeps the destination type opaque; its `Debug` form wraps the
/// absolute URI being dialed, e.g. `Unnameable(http://10.0.0.5:80/)`. A
/// destination whose host cannot be read is refused.
fn check_destination(
    policy: &EgressPolicy,
    destination: &impl fmt::Debug,
) -> Result<(), EgressError> {
    let rendered = format!("{destination:?}");
    let url = destination_url(&rendered).ok_or_else(|| EgressError::MissingHost {
        url: rendered.clone(),
    })?;
    match url.host() {
        Some(Host::Ipv4(v4)) => policy.check_ip(v4.into()),
        Some(Host::Ipv6(v6)) => policy.check_ip(v6.into()),
        Some(Host::Domain(domain)) if !domain.is_empty() => policy.check_host(domain),
        _ => Err(EgressError::MissingHost { url: rendered }),
    }
}

fn destination_url(rendered: &str) -> Option<Url> {
    let start = rendered.find('(').map_or(0, |open| open + 1);
    let end = rendered
        .rfind(')')
        .filter(|close| *close >= start)
        .unwrap_or(rendered.len());
    Url::parse(rendered.get(start..end)?.trim()).ok()
}
