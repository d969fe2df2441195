//! Ordinary hostname resolution used when no TXT override applies.

use std::net::IpAddr;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use hickory_resolver::config::{
    LookupIpStrategy, NameServerConfig, ResolveHosts, ResolverConfig as HickoryConfig,
    ResolverOpts,
};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver, TokioResolver};

use crate::dns::config::ResolverConfig;
use crate::error::{NetworkError, Result};

/// Resolves a hostname to every address it has, in resolver order.
///
/// Both address families are expected; choosing among them is the
/// resolver's job. An empty list is a valid answer.
pub trait HostLookup: Send + Sync {
    /// Look up all addresses of `hostname`.
    fn lookup_all<'a>(&'a self, hostname: &'a str) -> BoxFuture<'a, Result<Vec<IpAddr>>>;
}

/// Hostname lookup through hickory-resolver.
///
/// Queries A and AAAA records together, honoring the hosts file when
/// configured. hickory keeps its own record cache, sized by
/// [`ResolverConfig::cache_size`].
pub struct HickoryHostLookup {
    resolver: TokioResolver,
}

impl HickoryHostLookup {
    /// Create a lookup with the given configuration.
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let (resolver_config, resolver_opts) = build_resolver_config(config)?;

        let resolver =
            Resolver::builder_with_config(resolver_config, TokioConnectionProvider::default())
                .with_options(resolver_opts)
                .build();

        Ok(Self { resolver })
    }

    /// Create a lookup using system DNS settings.
    pub fn system() -> Result<Self> {
        Self::new(&ResolverConfig::system())
    }

    /// Drop every cached record.
    pub fn clear_cache(&self) {
        self.resolver.clear_cache();
    }
}

impl HostLookup for HickoryHostLookup {
    fn lookup_all<'a>(&'a self, hostname: &'a str) -> BoxFuture<'a, Result<Vec<IpAddr>>> {
        async move {
            let response = self
                .resolver
                .lookup_ip(hostname)
                .await
                .map_err(|e| NetworkError::Dns(e.to_string()))?;
            Ok(response.iter().collect())
        }
        .boxed()
    }
}

/// Hostname lookup through the operating system (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostLookup;

impl HostLookup for SystemHostLookup {
    fn lookup_all<'a>(&'a self, hostname: &'a str) -> BoxFuture<'a, Result<Vec<IpAddr>>> {
        async move {
            let addrs = tokio::net::lookup_host((hostname, 0)).await?;
            let mut candidates = Vec::new();
            for addr in addrs {
                if !candidates.contains(&addr.ip()) {
                    candidates.push(addr.ip());
                }
            }
            Ok(candidates)
        }
        .boxed()
    }
}

/// Build hickory resolver configuration from our ResolverConfig.
fn build_resolver_config(config: &ResolverConfig) -> Result<(HickoryConfig, ResolverOpts)> {
    let resolver_config = if config.use_system_config {
        let (system_config, _opts) = hickory_resolver::system_conf::read_system_conf().map_err(|e| {
            NetworkError::Config(format!("Failed to read system DNS configuration: {e}"))
        })?;
        system_config
    } else if config.nameservers.is_empty() {
        return Err(NetworkError::Config("No nameservers configured".to_string()));
    } else {
        let mut resolver_config = HickoryConfig::new();
        for addr in &config.nameservers {
            resolver_config.add_name_server(NameServerConfig::new(*addr, Protocol::Udp));
            resolver_config.add_name_server(NameServerConfig::new(*addr, Protocol::Tcp));
        }
        resolver_config
    };

    let mut opts = ResolverOpts::default();
    opts.cache_size = config.cache_size;
    opts.use_hosts_file = if config.use_hosts_file {
        ResolveHosts::Auto
    } else {
        ResolveHosts::Never
    };
    opts.attempts = config.attempts;
    opts.timeout = config.timeout;
    // Family preference is applied by the endpoint resolver, so ask for both.
    opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;

    Ok((resolver_config, opts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_custom_nameservers() {
        let config = ResolverConfig::google().cache_size(8).use_hosts_file(false);
        let (resolver_config, opts) = build_resolver_config(&config).unwrap();
        assert_eq!(resolver_config.name_servers().len(), 4);
        assert_eq!(opts.cache_size, 8);
        assert_eq!(opts.ip_strategy, LookupIpStrategy::Ipv4AndIpv6);
    }

    #[test]
    fn test_build_config_without_nameservers() {
        let config = ResolverConfig::with_nameservers(vec![]);
        assert!(matches!(
            build_resolver_config(&config),
            Err(NetworkError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_system_lookup_localhost() {
        let candidates = SystemHostLookup.lookup_all("localhost").await.unwrap();
        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(IpAddr::is_loopback));
    }
}
