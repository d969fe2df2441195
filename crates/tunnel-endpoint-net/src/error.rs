//! Error types for endpoint parsing and resolution.

use std::fmt;

use tunnel_endpoint_wire::MalformedMessage;

/// Errors raised by endpoint parsing and the resolution pipeline.
///
/// Only [`InvalidEndpoint`](Self::InvalidEndpoint) and
/// [`Config`](Self::Config) ever reach callers of the public API; the
/// remaining variants are produced by transports and absorbed by the
/// resolver as resolution misses.
#[derive(Debug, Clone)]
pub enum NetworkError {
    /// Endpoint text could not be parsed as `host:port`.
    InvalidEndpoint {
        /// The text that was rejected.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The TXT query could not be sent or answered.
    Transport(String),
    /// The TXT query timed out.
    Timeout,
    /// The TXT response could not be decoded.
    Malformed(MalformedMessage),
    /// Hostname lookup failed.
    Dns(String),
    /// Resolver configuration is unusable.
    Config(String),
    /// I/O error.
    Io(String),
}

impl NetworkError {
    /// Create an invalid endpoint error.
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEndpoint { endpoint, reason } => {
                write!(f, "Invalid endpoint '{endpoint}': {reason}")
            }
            Self::Transport(msg) => write!(f, "DNS transport error: {msg}"),
            Self::Timeout => write!(f, "DNS query timed out"),
            Self::Malformed(err) => write!(f, "Malformed DNS response: {err}"),
            Self::Dns(msg) => write!(f, "DNS lookup error: {msg}"),
            Self::Config(msg) => write!(f, "Resolver configuration error: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MalformedMessage> for NetworkError {
    fn from(err: MalformedMessage) -> Self {
        Self::Malformed(err)
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::TimedOut {
            Self::Timeout
        } else {
            Self::Io(err.to_string())
        }
    }
}

impl From<hickory_resolver::proto::ProtoError> for NetworkError {
    fn from(err: hickory_resolver::proto::ProtoError) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A specialized Result type for endpoint operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
