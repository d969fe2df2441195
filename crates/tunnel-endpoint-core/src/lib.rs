//! Core support for tunnel endpoint resolution.
//!
//! This crate holds the pieces shared by the rest of the workspace:
//!
//! - [`logging`]: tracing targets used by every crate, plus
//!   thin wrapper macros with consistent target naming.
//! - [`runtime`]: the dedicated worker runtime that endpoint resolution is
//!   dispatched to, so that network I/O never runs on a caller's main
//!   context.
//!
//! # Example
//!
//! ```no_run
//! use tunnel_endpoint_core::runtime::WorkerRuntime;
//!
//! let runtime = WorkerRuntime::global();
//! let handle = runtime.spawn(async { 1 + 1 });
//! assert_eq!(handle.blocking_wait(), Some(2));
//! ```

pub mod logging;
pub mod runtime;

pub use runtime::{RuntimeError, RuntimeFlavor, TaskHandle, WorkerRuntime, WorkerRuntimeConfig};
