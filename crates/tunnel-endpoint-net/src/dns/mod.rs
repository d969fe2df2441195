//! DNS side of endpoint resolution.
//!
//! Turns a hostname endpoint into a numeric one, caching the outcome per
//! endpoint for a refresh interval.
//!
//! # Features
//!
//! - **TXT override**: a `ipv4:port` TXT record on the hostname wins over
//!   ordinary resolution, port included
//! - **IPv4 preference**: hostname lookups prefer the first IPv4 candidate
//! - **Refresh cache**: at most one network resolution per endpoint per
//!   refresh interval, failures included
//! - **Pluggable transports**: [`TxtTransport`] and [`HostLookup`] can be
//!   replaced, e.g. in tests
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use tunnel_endpoint_net::dns::{EndpointResolver, ResolverConfig};
//!
//! let config = ResolverConfig::cloudflare()
//!     .refresh_interval(Duration::from_secs(30))
//!     .timeout(Duration::from_secs(2));
//!
//! let resolver = EndpointResolver::new(config)?;
//! ```

mod cache;
mod config;
mod lookup;
mod resolver;
mod transport;
mod txt_override;

pub use cache::ResolutionCache;
pub use config::{DEFAULT_REFRESH_INTERVAL, ResolverConfig};
pub use lookup::{HickoryHostLookup, HostLookup, SystemHostLookup};
pub use resolver::EndpointResolver;
pub use transport::{TxtTransport, UdpTxtTransport};
pub use txt_override::{find_override, parse_override};
