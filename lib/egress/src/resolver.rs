//! Connection-time address validation.
//!
//! reqwest hands every hostname to the configured resolver and dials exactly
//! the addresses it returns (proxies are disabled on egress clients). Guarding
//! the resolver therefore checks the addresses that are actually connected to,
//! after DNS has answered, which is what defeats rebinding: a name that looked
//! public during URL validation cannot resolve to a private address later.

use crate::policy::EgressPolicy;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

/// Resolves through the operating system via tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let addrs = tokio::net::lookup_host((name.as_str(), 0)).await?;
            let addrs: Addrs = Box::new(addrs.collect::<Vec<SocketAddr>>().into_iter());
            Ok(addrs)
        })
    }
}

/// Wraps a resolver and rejects any answer containing a blocked address.
///
/// One blocked address fails the whole lookup rather than being filtered out,
/// so a mixed answer cannot be used to map which internal hosts exist.
pub struct GuardedResolver {
    inner: Arc<dyn Resolve>,
    policy: Arc<EgressPolicy>,
}

impl GuardedResolver {
    #[must_use]
    pub fn new(inner: Arc<dyn Resolve>, policy: Arc<EgressPolicy>) -> Self {
        Self { inner, policy }
    }
}

impl Resolve for GuardedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let inner = Arc::clone(&self.inner);
        let policy = Arc::clone(&self.policy);
        Box::pin(async move {
            let host = name.as_str().to_string();
            let addrs: Vec<SocketAddr> = inner.resolve(name).await?.collect();
            for addr in &addrs {
                if let Err(err) = policy.check_ip(addr.ip()) {
                    warn!(
                        host = %host,
                        address = %addr.ip(),
                        "blocked connection to resolved address"
                    );
                    return Err(Box::new(err) as Box<dyn std::error::Error + Send + Sync>);
                }
            }
            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok(addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EgressError;
    use std::net::IpAddr;
    use std::str::FromStr;

    struct StaticResolver(Vec<IpAddr>);

    impl Resolve for StaticResolver {
        fn resolve(&self, _name: Name) -> Resolving {
            let addrs: Vec<SocketAddr> = self.0.iter().map(|ip| SocketAddr::new(*ip, 0)).collect();
            Box::pin(async move {
                let addrs: Addrs = Box::new(addrs.into_iter());
                Ok(addrs)
            })
        }
    }

    fn guarded(ips: &[&str]) -> GuardedResolver {
        let ips = ips.iter().map(|ip| ip.parse().expect("ip")).collect();
        GuardedResolver::new(
            Arc::new(StaticResolver(ips)),
            Arc::new(EgressPolicy::default()),
        )
    }

    #[tokio::test]
    async fn passes_public_answers_through() {
        let name = Name::from_str("example.com").expect("name");
        let addrs: Vec<_> = guarded(&["93.184.216.34"])
            .resolve(name)
            .await
            .expect("resolves")
            .collect();
        assert_eq!(addrs.len(), 1);
    }

    #[tokio::test]
    async fn rejects_answer_with_private_address() {
        let name = Name::from_str("rebind.example.com").expect("name");
        let err = guarded(&["93.184.216.34", "10.0.0.5"])
            .resolve(name)
            .await
            .err()
            .expect("blocked");
        let egress = err.downcast_ref::<EgressError>().expect("egress error");
        assert_eq!(
            *egress,
            EgressError::BlockedAddress {
                address: "10.0.0.5".parse().expect("ip")
            }
        );
    }
}
