//! Tracing integration for tunnel endpoint resolution.
//!
//! Every crate in the workspace logs through the `tracing` crate with one of
//! the targets below, so applications can filter resolution chatter
//! independently from the rest of their logs:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("tunnel_endpoint::resolver=debug,tunnel_endpoint::wire=warn")
//!     .init();
//! ```
//!
//! Installing a subscriber is the application's job; nothing here does it.

/// Target names for log filtering.
pub mod targets {
    /// Core target (runtime and shared helpers).
    pub const CORE: &str = "tunnel_endpoint";
    /// DNS wire-format decoding.
    pub const WIRE: &str = "tunnel_endpoint::wire";
    /// Endpoint resolution and the resolution cache.
    pub const RESOLVER: &str = "tunnel_endpoint::resolver";
    /// TXT query transport.
    pub const TRANSPORT: &str = "tunnel_endpoint::transport";
    /// Worker runtime.
    pub const RUNTIME: &str = "tunnel_endpoint::runtime";
}

/// Wrappers around the `tracing` macros with the core target.
#[macro_export]
macro_rules! endpoint_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "tunnel_endpoint", $($arg)*)
    };
}

#[macro_export]
macro_rules! endpoint_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "tunnel_endpoint", $($arg)*)
    };
}

#[macro_export]
macro_rules! endpoint_info {
    ($($arg:tt)*) => {
        tracing::info!(target: "tunnel_endpoint", $($arg)*)
    };
}

#[macro_export]
macro_rules! endpoint_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "tunnel_endpoint", $($arg)*)
    };
}
