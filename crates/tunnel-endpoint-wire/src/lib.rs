//! DNS wire-format decoding for TXT responses.
//!
//! The input to this crate is a raw DNS response as delivered by a platform
//! resolver. It is untrusted: every length field in it may lie. The decoder
//! checks the remaining length before every read and reports a
//! [`MalformedMessage`] instead of ever indexing out of bounds.
//!
//! Only TXT records of class IN are decoded; every other record in the
//! answer section is skipped by its declared RDLENGTH. Compression pointers
//! in owner names are skipped, never followed.
//!
//! # Example
//!
//! ```
//! use tunnel_endpoint_wire::decode_txt_records;
//!
//! // Header with zero questions and zero answers.
//! let empty = [0u8; 12];
//! assert!(decode_txt_records(&empty)?.is_empty());
//! # Ok::<(), tunnel_endpoint_wire::MalformedMessage>(())
//! ```

/// Tracing target for everything this crate logs.
pub const LOG_TARGET: &str = "tunnel_endpoint::wire";

mod error;
mod message;
mod reader;

pub use error::{MalformedMessage, Result};
pub use message::{
    CLASS_IN, DecodedMessage, HEADER_LEN, Header, TYPE_TXT, decode, decode_txt_records,
};
