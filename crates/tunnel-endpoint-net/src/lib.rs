//! Tunnel peer endpoints and their resolution.
//!
//! A tunnel peer is configured with an external endpoint, `host:port`,
//! where the host is either a literal address or a DNS hostname. This crate
//! parses such endpoints and resolves hostname endpoints to numeric ones:
//!
//! - **Endpoints**: [`Endpoint`] parsing, including `[v6]:port` literals
//! - **TXT override**: a TXT record of the form `ipv4:port` on the hostname
//!   replaces both address and port
//! - **Fallback**: ordinary hostname resolution preferring IPv4
//! - **Refresh cache**: each [`PeerEndpoint`] re-resolves at most once per
//!   refresh interval
//!
//! # Example
//!
//! ```ignore
//! use tunnel_endpoint_net::{EndpointResolver, PeerEndpoint, ResolverConfig};
//!
//! let resolver = EndpointResolver::new(ResolverConfig::system())?;
//! let peer = PeerEndpoint::parse("vpn.example.com:51820")?;
//!
//! match peer.resolve(&resolver).await {
//!     Some(endpoint) => println!("sending to {endpoint}"),
//!     None => println!("{peer} is unresolved"),
//! }
//! ```
//!
//! # Off-thread resolution
//!
//! Resolution performs network I/O. Callers without an async context can
//! hand it to the worker runtime:
//!
//! ```ignore
//! use std::sync::Arc;
//! use tunnel_endpoint_core::WorkerRuntime;
//!
//! let peer = Arc::new(PeerEndpoint::parse("vpn.example.com:51820")?);
//! let handle = resolver.spawn_resolve(WorkerRuntime::global(), peer);
//! let resolved = handle.blocking_wait().flatten();
//! ```

pub mod dns;
mod endpoint;
mod error;
mod peer;

pub use dns::{EndpointResolver, ResolutionCache, ResolverConfig};
pub use endpoint::{Endpoint, is_numeric_address};
pub use error::{NetworkError, Result};
pub use peer::PeerEndpoint;
