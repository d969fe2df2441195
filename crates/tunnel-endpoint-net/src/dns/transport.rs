//! TXT query transport.
//!
//! The resolver only needs raw response bytes for a TXT query; how they are
//! obtained is up to the [`TxtTransport`] implementation. The default,
//! [`UdpTxtTransport`], sends a single-question query to a nameserver over
//! UDP and hands back the datagram untouched, leaving all parsing to
//! [`tunnel_endpoint_wire`].

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use hickory_resolver::proto::op::{Message, MessageType, OpCode, Query};
use hickory_resolver::proto::rr::{Name, RecordType};
use hickory_resolver::proto::serialize::binary::BinEncodable;
use tokio::net::UdpSocket;
use tunnel_endpoint_core::logging::targets;

use crate::dns::config::ResolverConfig;
use crate::error::{NetworkError, Result};

/// Largest response accepted over UDP.
const MAX_RESPONSE_LEN: usize = 4096;

/// Sends a TXT/IN query for a name and returns the raw DNS response.
///
/// Implementations carry their own timeout policy; the resolver never
/// cancels a query.
pub trait TxtTransport: Send + Sync {
    /// Query TXT records for `name`.
    fn query_txt<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// UDP transport to a fixed list of nameservers.
///
/// Each attempt sends the query to every nameserver in turn until one
/// answers with a matching query id within the timeout.
#[derive(Debug, Clone)]
pub struct UdpTxtTransport {
    nameservers: Vec<SocketAddr>,
    timeout: Duration,
    attempts: usize,
}

impl UdpTxtTransport {
    /// Create a transport from resolver configuration.
    ///
    /// With `use_system_config`, nameservers are read from the system
    /// resolver configuration.
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let nameservers = if config.use_system_config {
            system_nameservers()?
        } else {
            config.nameservers.clone()
        };

        if nameservers.is_empty() {
            return Err(NetworkError::Config("No nameservers configured".to_string()));
        }

        Ok(Self {
            nameservers,
            timeout: config.timeout,
            attempts: config.attempts.max(1),
        })
    }

    /// The nameservers queried, in order.
    pub fn nameservers(&self) -> &[SocketAddr] {
        &self.nameservers
    }

    async fn query(&self, name: &str) -> Result<Vec<u8>> {
        let id = rand::random::<u16>();
        let query = build_query(name, id)?;
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            for &server in &self.nameservers {
                let exchange = exchange(server, &query, id);
                match tokio::time::timeout(self.timeout, exchange).await {
                    Ok(Ok(response)) => {
                        tracing::trace!(target: targets::TRANSPORT, %server, name, len = response.len(), "received TXT response");
                        return Ok(response);
                    }
                    Ok(Err(e)) => {
                        tracing::debug!(target: targets::TRANSPORT, %server, name, attempt, error = %e, "TXT query failed");
                        last_error = Some(e);
                    }
                    Err(_) => {
                        tracing::debug!(target: targets::TRANSPORT, %server, name, attempt, "TXT query timed out");
                        last_error = Some(NetworkError::Timeout);
                    }
                }
            }
        }

        Err(last_error.unwrap_or(NetworkError::Timeout))
    }
}

impl TxtTransport for UdpTxtTransport {
    fn query_txt<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        self.query(name).boxed()
    }
}

/// Encode a recursive TXT/IN query for `name`.
fn build_query(name: &str, id: u16) -> Result<Vec<u8>> {
    let name = Name::from_ascii(name)?;
    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    message.add_query(Query::query(name, RecordType::TXT));
    Ok(message.to_bytes()?)
}

/// Send `query` to `server` and wait for the datagram echoing `id`.
async fn exchange(server: SocketAddr, query: &[u8], id: u16) -> Result<Vec<u8>> {
    let bind: SocketAddr = if server.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(bind).await?;
    socket.connect(server).await?;
    socket.send(query).await?;

    let mut buf = vec![0u8; MAX_RESPONSE_LEN];
    loop {
        let len = socket.recv(&mut buf).await?;
        if len >= 2 && u16::from_be_bytes([buf[0], buf[1]]) == id {
            buf.truncate(len);
            return Ok(buf);
        }
        tracing::trace!(target: targets::TRANSPORT, %server, len, "ignoring datagram with foreign id");
    }
}

/// Nameserver addresses from the system resolver configuration.
fn system_nameservers() -> Result<Vec<SocketAddr>> {
    let (config, _opts) = hickory_resolver::system_conf::read_system_conf()
        .map_err(|e| NetworkError::Config(format!("Failed to read system DNS configuration: {e}")))?;

    let mut servers = Vec::new();
    for ns in config.name_servers() {
        if !servers.contains(&ns.socket_addr) {
            servers.push(ns.socket_addr);
        }
    }
    Ok(servers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_header() {
        let query = build_query("vpn.example.com", 0xbeef).unwrap();
        assert_eq!(&query[..2], &[0xbe, 0xef]);
        // RD set, single question, no answers.
        assert_eq!(query[2] & 0x01, 0x01);
        assert_eq!(&query[4..8], &[0, 1, 0, 0]);
        // QTYPE TXT, QCLASS IN close the question.
        assert_eq!(&query[query.len() - 4..], &[0, 16, 0, 1]);
    }

    #[test]
    fn test_build_query_is_decodable() {
        let query = build_query("vpn.example.com", 7).unwrap();
        let message = tunnel_endpoint_wire::decode(&query).unwrap();
        assert_eq!(message.header().id, 7);
        assert!(!message.header().is_response());
        assert!(message.is_empty());
    }

    #[test]
    fn test_empty_nameservers_rejected() {
        let config = ResolverConfig::with_nameservers(vec![]);
        assert!(matches!(
            UdpTxtTransport::new(&config),
            Err(NetworkError::Config(_))
        ));
    }

    #[test]
    fn test_attempts_at_least_one() {
        let config = ResolverConfig::cloudflare().attempts(0);
        let transport = UdpTxtTransport::new(&config).unwrap();
        assert_eq!(transport.attempts, 1);
        assert_eq!(transport.nameservers().len(), 2);
    }

    #[tokio::test]
    async fn test_exchange_with_local_server() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            // A stray datagram with the wrong id first, then the real answer.
            server
                .send_to(&[!buf[0], buf[1], 0x81, 0x80], peer)
                .await
                .unwrap();
            let mut response = buf[..len].to_vec();
            response[2] |= 0x80;
            server.send_to(&response, peer).await.unwrap();
        });

        let config = ResolverConfig::with_nameservers(vec![server_addr])
            .timeout(Duration::from_secs(2));
        let transport = UdpTxtTransport::new(&config).unwrap();
        let response = transport.query_txt("vpn.example.com").await.unwrap();

        let message = tunnel_endpoint_wire::decode(&response).unwrap();
        assert!(message.header().is_response());
        assert_eq!(message.header().qdcount, 1);
    }

    #[tokio::test]
    async fn test_unanswered_query_times_out() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = ResolverConfig::with_nameservers(vec![silent.local_addr().unwrap()])
            .timeout(Duration::from_millis(50))
            .attempts(1);
        let transport = UdpTxtTransport::new(&config).unwrap();

        let result = transport.query_txt("vpn.example.com").await;
        assert!(matches!(result, Err(NetworkError::Timeout)));
    }
}
