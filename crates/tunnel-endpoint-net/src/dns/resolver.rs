//! Endpoint resolution pipeline.

use std::net::IpAddr;
use std::sync::Arc;

use tokio::time::Instant;
use tunnel_endpoint_core::logging::targets;
use tunnel_endpoint_core::runtime::{TaskHandle, WorkerRuntime};
use tunnel_endpoint_wire::{MalformedMessage, decode};

use crate::dns::cache::ResolutionCache;
use crate::dns::config::ResolverConfig;
use crate::dns::lookup::{HickoryHostLookup, HostLookup};
use crate::dns::transport::{TxtTransport, UdpTxtTransport};
use crate::dns::txt_override::find_override;
use crate::endpoint::Endpoint;
use crate::error::{NetworkError, Result};
use crate::peer::PeerEndpoint;

/// Why the TXT override step produced no endpoint, or the endpoint it found.
#[derive(Debug)]
enum OverrideOutcome {
    Found(Endpoint),
    Disabled,
    NoMatch {
        segments: usize,
        rcode: u8,
        truncated: bool,
    },
    Malformed(MalformedMessage),
    Failed(NetworkError),
}

/// Resolves hostname endpoints to numeric ones.
///
/// Resolution runs two steps strictly in order:
///
/// 1. **TXT override**: query TXT records for the host and adopt the first
///    `ipv4:port` segment, including its port.
/// 2. **Fallback**: ordinary hostname lookup, preferring the first IPv4
///    candidate over any IPv6 one, keeping the configured port.
///
/// Step 2 only runs if step 1 found nothing. Errors from either step are
/// logged and treated as misses; the outcome, found or not, is cached in
/// the endpoint's [`ResolutionCache`] for the refresh interval.
///
/// Cloning is cheap and shares the transports.
///
/// # Example
///
/// ```ignore
/// use tunnel_endpoint_net::{EndpointResolver, PeerEndpoint};
///
/// let resolver = EndpointResolver::system()?;
/// let peer = PeerEndpoint::parse("vpn.example.com:51820")?;
///
/// if let Some(endpoint) = peer.resolve(&resolver).await {
///     println!("connecting to {endpoint}");
/// }
/// ```
#[derive(Clone)]
pub struct EndpointResolver {
    config: Arc<ResolverConfig>,
    transport: Arc<dyn TxtTransport>,
    lookup: Arc<dyn HostLookup>,
}

impl EndpointResolver {
    /// Create a resolver with the default UDP transport and hickory lookup.
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let transport = Arc::new(UdpTxtTransport::new(&config)?);
        let lookup = Arc::new(HickoryHostLookup::new(&config)?);
        Ok(Self::with_transports(config, transport, lookup))
    }

    /// Create a resolver using system DNS settings.
    pub fn system() -> Result<Self> {
        Self::new(ResolverConfig::system())
    }

    /// Create a resolver over caller-supplied capabilities.
    pub fn with_transports(
        config: ResolverConfig,
        transport: Arc<dyn TxtTransport>,
        lookup: Arc<dyn HostLookup>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            lookup,
        }
    }

    /// The resolver configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a peer endpoint. Same as [`PeerEndpoint::resolve`].
    pub async fn resolve(&self, peer: &PeerEndpoint) -> Option<Endpoint> {
        peer.resolve(self).await
    }

    /// Resolve a peer endpoint on the worker runtime.
    ///
    /// The returned handle can be awaited or waited on from a blocking
    /// thread.
    pub fn spawn_resolve(
        &self,
        runtime: &WorkerRuntime,
        peer: Arc<PeerEndpoint>,
    ) -> TaskHandle<Option<Endpoint>> {
        let resolver = self.clone();
        runtime.spawn(async move { peer.resolve(&resolver).await })
    }

    /// Resolve through `cache`, refreshing it if stale.
    #[tracing::instrument(
        skip(self, endpoint, cache),
        fields(endpoint = %endpoint),
        target = "tunnel_endpoint::resolver",
        level = "debug"
    )]
    pub(crate) async fn resolve_cached(
        &self,
        endpoint: &Endpoint,
        cache: &ResolutionCache,
    ) -> Option<Endpoint> {
        let interval = self.config.refresh_interval;
        if let Some(cached) = cache.fresh(Instant::now(), interval) {
            return cached;
        }

        let _refresh = cache.lock_refresh().await;
        // Someone else may have refreshed while we waited.
        if let Some(cached) = cache.fresh(Instant::now(), interval) {
            tracing::trace!(target: targets::RESOLVER, "reusing concurrent resolution");
            return cached;
        }

        let resolved = self.resolve_uncached(endpoint).await;
        cache.store(resolved.clone(), Instant::now());
        resolved
    }

    async fn resolve_uncached(&self, endpoint: &Endpoint) -> Option<Endpoint> {
        match self.lookup_override(endpoint.host()).await {
            OverrideOutcome::Found(resolved) => {
                tracing::info!(target: targets::RESOLVER, %endpoint, %resolved, "adopted TXT override");
                return Some(resolved);
            }
            OverrideOutcome::Disabled => {}
            OverrideOutcome::NoMatch {
                segments,
                rcode,
                truncated,
            } => {
                tracing::debug!(target: targets::RESOLVER, %endpoint, segments, rcode, truncated, "no TXT override");
            }
            OverrideOutcome::Malformed(err) => {
                tracing::warn!(target: targets::RESOLVER, %endpoint, error = %err, "malformed TXT response, falling back");
            }
            OverrideOutcome::Failed(err) => {
                tracing::debug!(target: targets::RESOLVER, %endpoint, error = %err, "TXT lookup failed, falling back");
            }
        }

        let resolved = self.lookup_fallback(endpoint).await;
        match &resolved {
            Some(resolved) => {
                tracing::debug!(target: targets::RESOLVER, %endpoint, %resolved, "resolved by hostname lookup");
            }
            None => {
                tracing::debug!(target: targets::RESOLVER, %endpoint, "endpoint unresolved");
            }
        }
        resolved
    }

    async fn lookup_override(&self, host: &str) -> OverrideOutcome {
        if !self.config.txt_override {
            return OverrideOutcome::Disabled;
        }

        let response = match self.transport.query_txt(host).await {
            Ok(response) => response,
            Err(NetworkError::Malformed(err)) => return OverrideOutcome::Malformed(err),
            Err(err) => return OverrideOutcome::Failed(err),
        };

        let message = match decode(&response) {
            Ok(message) => message,
            Err(err) => return OverrideOutcome::Malformed(err),
        };

        match find_override(message.segments()) {
            Some(resolved) => OverrideOutcome::Found(resolved),
            None => OverrideOutcome::NoMatch {
                segments: message.len(),
                rcode: message.header().rcode(),
                truncated: message.header().is_truncated(),
            },
        }
    }

    async fn lookup_fallback(&self, endpoint: &Endpoint) -> Option<Endpoint> {
        let candidates = match self.lookup.lookup_all(endpoint.host()).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::debug!(target: targets::RESOLVER, %endpoint, error = %err, "hostname lookup failed");
                return None;
            }
        };

        preferred_address(&candidates).map(|addr| Endpoint::numeric(addr, endpoint.port()))
    }
}

impl std::fmt::Debug for EndpointResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// The first IPv4 candidate, else the first candidate of any family.
///
/// IPv4 wins to sidestep DNS64 synthesized addresses and IPv6 NAT.
fn preferred_address(candidates: &[IpAddr]) -> Option<IpAddr> {
    candidates
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| candidates.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_preferred_address_picks_first_ipv4() {
        let v6 = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));
        let v4a = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
        let v4b = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2));
        assert_eq!(preferred_address(&[v6, v4a, v4b]), Some(v4a));
    }

    #[test]
    fn test_preferred_address_falls_back_to_first() {
        let v6a = IpAddr::V6(Ipv6Addr::LOCALHOST);
        let v6b = IpAddr::V6(Ipv6Addr::UNSPECIFIED);
        assert_eq!(preferred_address(&[v6a, v6b]), Some(v6a));
        assert_eq!(preferred_address(&[]), None);
    }
}
