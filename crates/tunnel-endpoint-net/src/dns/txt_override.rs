//! The `ipv4:port` TXT override convention.
//!
//! A peer operator can publish a TXT record such as `198.51.100.7:51821` on
//! the peer's hostname. When present it replaces both the address and the
//! configured port of the endpoint.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::LazyLock;

use regex::Regex;

use crate::endpoint::Endpoint;

// ASCII digits only; `\d` would also accept other Unicode digits.
static IPV4_PORT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,3}(?:\.[0-9]{1,3}){3}):([0-9]{1,5})$")
        .expect("override pattern is valid")
});

/// Interpret one TXT segment as an override.
///
/// Returns `None` unless the whole segment is a dotted quad followed by a
/// port, the quad is a valid IPv4 address and the port fits in 16 bits.
pub fn parse_override(record: &str) -> Option<Endpoint> {
    let captures = IPV4_PORT_PATTERN.captures(record)?;
    let addr: Ipv4Addr = captures[1].parse().ok()?;
    let port: u16 = captures[2].parse().ok()?;
    Some(Endpoint::numeric(IpAddr::V4(addr), port))
}

/// The first override among `records`, in order.
pub fn find_override<I>(records: I) -> Option<Endpoint>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    records
        .into_iter()
        .find_map(|record| parse_override(record.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_override() {
        let endpoint = parse_override("198.51.100.7:51821").unwrap();
        assert!(endpoint.is_numeric());
        assert_eq!(endpoint.host(), "198.51.100.7");
        assert_eq!(endpoint.port(), 51821);
    }

    #[test]
    fn test_shape_mismatches() {
        for record in [
            "",
            "198.51.100.7",
            "198.51.100.7:",
            "198.51.100:51821",
            "198.51.100.7:518210",
            " 198.51.100.7:51821",
            "198.51.100.7:51821 ",
            "[2001:db8::1]:51821",
            "vpn.example.com:51821",
            "v=spf1 include:198.51.100.7:1",
            "١٩٨.51.100.7:51821",
        ] {
            assert_eq!(parse_override(record), None, "{record:?}");
        }
    }

    #[test]
    fn test_out_of_range_values() {
        assert_eq!(parse_override("256.0.0.1:51820"), None);
        assert_eq!(parse_override("198.51.100.7:65536"), None);
        assert_eq!(parse_override("198.51.100.7:99999"), None);
        assert!(parse_override("198.51.100.7:65535").is_some());
        assert!(parse_override("0.0.0.0:0").is_some());
    }

    #[test]
    fn test_first_match_wins() {
        let records = ["hello", "999.1.1.1:1", "192.0.2.9:1000", "192.0.2.10:2000"];
        let endpoint = find_override(records).unwrap();
        assert_eq!(endpoint.to_string(), "192.0.2.9:1000");
    }

    #[test]
    fn test_no_records() {
        assert_eq!(find_override(Vec::<String>::new()), None);
    }
}
