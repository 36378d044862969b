//! The egress context: a policy-enforcing HTTP client.

use crate::connector::ConnectGuardLayer;
use crate::error::EgressError;
use crate::network::{DEFAULT_BLOCKED_HOSTS, DEFAULT_BLOCKED_NETWORKS, IpNetwork};
use crate::policy::EgressPolicy;
use crate::request::EgressRequest;
use crate::resolver::{GuardedResolver, SystemResolver};
use crate::response::EgressResponse;
use reqwest::dns::Resolve;
use reqwest::redirect;
use reqwest::{Client, IntoUrl, Method, Request};
use rootcause::Report;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Maximum number of redirects followed before failing.
pub const MAX_REDIRECTS: usize = 10;

/// Construction-time settings for an [`EgressContext`].
#[derive(Clone)]
pub struct EgressOptions {
    /// Hostnames rejected by exact or `.`-suffix match.
    pub blocked_hosts: Vec<String>,
    /// Networks rejected both for literal IPs and for resolved addresses.
    pub blocked_networks: Vec<IpNetwork>,
    /// Upper bound on response body size, if any.
    pub max_response_bytes: Option<u64>,
    pub connect_timeout: Duration,
    /// Overall deadline for one request including redirects and body.
    pub timeout: Duration,
    pub pool_idle_timeout: Duration,
    /// Resolver consulted before the connection guard; the system resolver by default.
    pub resolver: Option<Arc<dyn Resolve>>,
}

impl Default for EgressOptions {
    fn default() -> Self {
        Self {
            blocked_hosts: DEFAULT_BLOCKED_HOSTS.iter().map(|h| (*h).to_string()).collect(),
            blocked_networks: DEFAULT_BLOCKED_NETWORKS.to_vec(),
            max_response_bytes: None,
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            resolver: None,
        }
    }
}

impl fmt::Debug for EgressOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EgressOptions")
            .field("blocked_hosts", &self.blocked_hosts)
            .field("blocked_networks", &self.blocked_networks)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("connect_timeout", &self.connect_timeout)
            .field("timeout", &self.timeout)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("custom_resolver", &self.resolver.is_some())
            .finish()
    }
}

/// SSRF-resistant HTTP client used by capabilities for outbound calls.
///
/// Cheap to clone; clones share the connection pool and policy.
#[derive(Clone)]
pub struct EgressContext {
    client: Client,
    policy: Arc<EgressPolicy>,
    max_response_bytes: Option<u64>,
}

impl EgressContext {
    /// Builds the client, connection guards and redirect policy.
    ///
    /// # Errors
    ///
    /// Returns `ClientBuild` if the TLS backend cannot be initialized.
    pub fn new(options: EgressOptions) -> Result<Self, Report<EgressError>> {
        let policy = Arc::new(EgressPolicy::new(
            options.blocked_hosts,
            options.blocked_networks,
        ));
        let inner: Arc<dyn Resolve> = options
            .resolver
            .unwrap_or_else(|| Arc::new(SystemResolver));
        let resolver = GuardedResolver::new(inner, Arc::clone(&policy));

        let client = Client::builder()
            .no_proxy()
            .redirect(redirect_policy(Arc::clone(&policy)))
            .dns_resolver(Arc::new(resolver))
            .connector_layer(ConnectGuardLayer::new(Arc::clone(&policy)))
            .connect_timeout(options.connect_timeout)
            .timeout(options.timeout)
            .pool_idle_timeout(options.pool_idle_timeout)
            .build()
            .map_err(|e| EgressError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            policy,
            max_response_bytes: options.max_response_bytes,
        })
    }

    /// The policy this context enforces.
    #[must_use]
    pub fn policy(&self) -> &EgressPolicy {
        &self.policy
    }

    #[must_use]
    pub fn max_response_bytes(&self) -> Option<u64> {
        self.max_response_bytes
    }

    /// Starts a request. Sending it runs [`EgressContext::execute`].
    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> EgressRequest {
        EgressRequest::new(self.clone(), self.client.request(method, url))
    }

    /// Convenience GET.
    ///
    /// # Errors
    ///
    /// See [`EgressContext::execute`].
    pub async fn get(&self, url: &str) -> Result<EgressResponse, Report<EgressError>> {
        self.request(Method::GET, url).send().await
    }

    /// Validates and executes a request.
    ///
    /// The URL is checked before any socket opens. At connect time the
    /// destination is checked again, and so is every address DNS returns for
    /// it. Every redirect target goes through the full URL check. A declared
    /// `Content-Length` above the maximum fails here, before the body is read.
    ///
    /// # Errors
    ///
    /// Returns an `EgressError` for policy rejections and transport failures.
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn execute(&self, request: Request) -> Result<EgressResponse, Report<EgressError>> {
        if let Err(err) = self.policy.check_url(request.url()) {
            warn!(error = %err, "egress request blocked");
            return Err(err.into());
        }

        let response = self.client.execute(request).await.map_err(|e| {
            let err = EgressError::from_reqwest(&e);
            if err.is_blocked() {
                warn!(error = %err, "egress request blocked");
            }
            err
        })?;

        if let (Some(limit), Some(declared)) =
            (self.max_response_bytes, response.content_length())
        {
            if declared > limit {
                warn!(limit, declared, "egress response too large");
                return Err(EgressError::ResponseTooLarge {
                    limit,
                    declared: Some(declared),
                }
                .into());
            }
        }

        debug!(status = %response.status(), "egress response received");
        Ok(EgressResponse::new(response, self.max_response_bytes))
    }
}

impl fmt::Debug for EgressContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EgressContext")
            .field("policy", &self.policy)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish_non_exhaustive()
    }
}

fn redirect_policy(policy: Arc<EgressPolicy>) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        // previous() holds every URL already requested, the original included.
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error(EgressError::TooManyRedirects {
                limit: MAX_REDIRECTS,
            });
        }
        match policy.check_url(attempt.url()) {
            Ok(()) => attempt.follow(),
            Err(err) => attempt.error(err),
        }
    })
}
