//! Resolver configuration types.

use std::net::SocketAddr;
use std::time::Duration;

/// How long a resolution result is trusted before the next access re-resolves.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for endpoint resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// How long a cached resolution (including a failed one) stays fresh.
    pub refresh_interval: Duration,

    /// Whether to consult TXT records for an `ipv4:port` override before
    /// ordinary hostname resolution.
    pub txt_override: bool,

    /// Use system DNS configuration (reads /etc/resolv.conf on Unix).
    /// If false, uses `nameservers`.
    pub use_system_config: bool,

    /// Custom nameservers to use when `use_system_config` is false.
    pub nameservers: Vec<SocketAddr>,

    /// Timeout for each DNS query attempt.
    pub timeout: Duration,

    /// Number of passes over the nameserver list for a TXT query, and
    /// retries for hostname lookups.
    pub attempts: usize,

    /// Whether hostname lookups read the hosts file.
    pub use_hosts_file: bool,

    /// Maximum number of entries in the hostname lookup cache.
    pub cache_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            txt_override: true,
            use_system_config: true,
            nameservers: Vec::new(),
            timeout: Duration::from_secs(5),
            attempts: 2,
            use_hosts_file: true,
            cache_size: 64,
        }
    }
}

impl ResolverConfig {
    /// Configuration with system DNS settings.
    pub fn system() -> Self {
        Self::default()
    }

    /// Configuration with custom nameservers.
    pub fn with_nameservers(nameservers: Vec<SocketAddr>) -> Self {
        Self {
            use_system_config: false,
            nameservers,
            ..Default::default()
        }
    }

    /// Use Google's public DNS servers.
    pub fn google() -> Self {
        Self::with_nameservers(vec![
            SocketAddr::from(([8, 8, 8, 8], 53)),
            SocketAddr::from(([8, 8, 4, 4], 53)),
        ])
    }

    /// Use Cloudflare's public DNS servers.
    pub fn cloudflare() -> Self {
        Self::with_nameservers(vec![
            SocketAddr::from(([1, 1, 1, 1], 53)),
            SocketAddr::from(([1, 0, 0, 1], 53)),
        ])
    }

    /// Set the refresh interval.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Enable or disable the TXT override lookup.
    pub fn txt_override(mut self, enabled: bool) -> Self {
        self.txt_override = enabled;
        self
    }

    /// Set the timeout per attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of attempts.
    pub fn attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set whether to use the hosts file.
    pub fn use_hosts_file(mut self, use_hosts: bool) -> Self {
        self.use_hosts_file = use_hosts;
        self
    }

    /// Set the hostname lookup cache size.
    pub fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }
}
