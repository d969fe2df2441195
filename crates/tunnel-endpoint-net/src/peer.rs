//! A peer's configured endpoint joined with its resolution cache.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use crate::dns::{EndpointResolver, ResolutionCache};
use crate::endpoint::Endpoint;
use crate::error::Result;

/// The endpoint configured for a tunnel peer.
///
/// Numeric endpoints resolve to themselves without touching the network.
/// Hostname endpoints get a [`ResolutionCache`], created on first
/// resolution and owned by this peer endpoint. Identity (equality, hashing,
/// display) is that of the configured [`Endpoint`]; the cache never takes
/// part in it.
#[derive(Debug)]
pub struct PeerEndpoint {
    endpoint: Endpoint,
    cache: OnceLock<ResolutionCache>,
}

impl PeerEndpoint {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            cache: OnceLock::new(),
        }
    }

    /// Parse `host:port` text into a peer endpoint.
    pub fn parse(endpoint: &str) -> Result<Self> {
        Endpoint::parse(endpoint).map(Self::new)
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The resolution cache, if this endpoint has ever been resolved.
    pub fn cache(&self) -> Option<&ResolutionCache> {
        self.cache.get()
    }

    /// Resolve to a numeric endpoint.
    ///
    /// Returns `None` if neither a TXT override nor a hostname lookup
    /// produced an address; that outcome is cached like any other.
    pub async fn resolve(&self, resolver: &EndpointResolver) -> Option<Endpoint> {
        if self.endpoint.is_numeric() {
            return Some(self.endpoint.clone());
        }

        let cache = self.cache.get_or_init(ResolutionCache::new);
        resolver.resolve_cached(&self.endpoint, cache).await
    }
}

impl From<Endpoint> for PeerEndpoint {
    fn from(endpoint: Endpoint) -> Self {
        Self::new(endpoint)
    }
}

impl PartialEq for PeerEndpoint {
    fn eq(&self, other: &Self) -> bool {
        self.endpoint == other.endpoint
    }
}

impl Eq for PeerEndpoint {}

impl Hash for PeerEndpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.endpoint.hash(state);
    }
}

impl fmt::Display for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.endpoint, f)
    }
}
