//! Endpoint value type.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use url::{Host, Url};

use crate::error::{NetworkError, Result};

const FORBIDDEN_CHARACTERS: [char; 3] = ['/', '?', '#'];

/// Whether `text` is a literal IPv4 or IPv6 address.
pub fn is_numeric_address(text: &str) -> bool {
    text.parse::<IpAddr>().is_ok()
}

/// Whether `host` uses only the characters a DNS hostname can carry.
///
/// `wg://` is not a special URL scheme, so the URL parser percent-encodes
/// anything else in the host instead of rejecting it.
fn is_hostname(host: &str) -> bool {
    host.bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// An external `host:port` endpoint of a tunnel peer.
///
/// The host is either a numeric address or a DNS hostname; which one is
/// decided once, at construction. Equality and hashing consider only the
/// host text and the port.
///
/// IPv6 hosts are stored without brackets and bracketed again by
/// [`Display`](fmt::Display).
#[derive(Debug, Clone)]
pub struct Endpoint {
    host: String,
    numeric: bool,
    port: u16,
}

impl Endpoint {
    /// Parse `host:port` text.
    ///
    /// Literal IPv6 hosts must use the `[host]:port` form. The text may not
    /// contain `/`, `?`, `#`, whitespace or user info, and must carry a port
    /// in `0..=65535`.
    ///
    /// # Example
    ///
    /// ```
    /// use tunnel_endpoint_net::Endpoint;
    ///
    /// let endpoint = Endpoint::parse("[2001:db8::1]:51820")?;
    /// assert!(endpoint.is_numeric());
    /// assert_eq!(endpoint.host(), "2001:db8::1");
    /// assert_eq!(endpoint.to_string(), "[2001:db8::1]:51820");
    /// # Ok::<(), tunnel_endpoint_net::NetworkError>(())
    /// ```
    pub fn parse(endpoint: &str) -> Result<Self> {
        if endpoint.contains(FORBIDDEN_CHARACTERS) {
            return Err(NetworkError::invalid_endpoint(endpoint, "Forbidden characters"));
        }
        if endpoint.chars().any(char::is_whitespace) {
            return Err(NetworkError::invalid_endpoint(endpoint, "Whitespace is not allowed"));
        }

        let url = Url::parse(&format!("wg://{endpoint}"))
            .map_err(|e| NetworkError::invalid_endpoint(endpoint, e.to_string()))?;

        if !url.username().is_empty() || url.password().is_some() {
            return Err(NetworkError::invalid_endpoint(endpoint, "User info is not allowed"));
        }

        let port = url
            .port()
            .ok_or_else(|| NetworkError::invalid_endpoint(endpoint, "Missing/invalid port number"))?;

        match url.host() {
            Some(Host::Ipv6(addr)) => Ok(Self::numeric(IpAddr::V6(addr), port)),
            Some(Host::Ipv4(addr)) => Ok(Self::numeric(IpAddr::V4(addr), port)),
            Some(Host::Domain("")) | None => {
                Err(NetworkError::invalid_endpoint(endpoint, "Missing host"))
            }
            Some(Host::Domain(host)) if is_hostname(host) => Ok(Self::new(host, port)),
            Some(Host::Domain(_)) => Err(NetworkError::invalid_endpoint(endpoint, "Invalid hostname")),
        }
    }

    /// Build an endpoint from a host string, classifying it as numeric or
    /// hostname.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        match host.parse::<IpAddr>() {
            Ok(addr) => Self::numeric(addr, port),
            Err(_) => Self {
                host,
                numeric: false,
                port,
            },
        }
    }

    /// Build a numeric endpoint.
    pub fn numeric(addr: IpAddr, port: u16) -> Self {
        Self {
            host: addr.to_string(),
            numeric: true,
            port,
        }
    }

    /// The host, without brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the host is a literal address needing no resolution.
    pub fn is_numeric(&self) -> bool {
        self.numeric
    }

    /// The host as an address, for numeric endpoints.
    pub fn ip(&self) -> Option<IpAddr> {
        if self.numeric {
            self.host.parse().ok()
        } else {
            None
        }
    }

    /// The endpoint as a socket address, for numeric endpoints.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.ip().map(|ip| SocketAddr::new(ip, self.port))
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::numeric(addr.ip(), addr.port())
    }
}

impl FromStr for Endpoint {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl Eq for Endpoint {}

impl Hash for Endpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.numeric && self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_classifies_host() {
        assert!(Endpoint::new("10.0.0.1", 1).is_numeric());
        assert!(Endpoint::new("::1", 1).is_numeric());
        assert!(!Endpoint::new("vpn.example.com", 1).is_numeric());
    }

    #[test]
    fn test_equality_ignores_category() {
        let a = Endpoint {
            host: "192.0.2.1".into(),
            numeric: false,
            port: 1,
        };
        let b = Endpoint::new("192.0.2.1", 1);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_ip_only_for_numeric() {
        assert_eq!(
            Endpoint::new("192.0.2.1", 7).socket_addr(),
            Some("192.0.2.1:7".parse().unwrap())
        );
        assert_eq!(Endpoint::new("example.com", 7).ip(), None);
    }

    #[test]
    fn test_from_socket_addr() {
        let endpoint = Endpoint::from("[2001:db8::2]:443".parse::<SocketAddr>().unwrap());
        assert!(endpoint.is_numeric());
        assert_eq!(endpoint.to_string(), "[2001:db8::2]:443");
    }

    #[test]
    fn test_is_hostname() {
        assert!(is_hostname("vpn-1.example_net.com"));
        assert!(!is_hostname("b%C3%BCcher.de"));
        assert!(!is_hostname("a,b"));
    }

    #[test]
    fn test_is_numeric_address() {
        assert!(is_numeric_address("198.51.100.7"));
        assert!(is_numeric_address("fe80::1"));
        assert!(!is_numeric_address("[fe80::1]"));
        assert!(!is_numeric_address("999.0.0.1"));
        assert!(!is_numeric_address("example.com"));
    }
}
