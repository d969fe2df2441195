//! Decoder error types.

/// Result type alias for decoding operations.
pub type Result<T> = std::result::Result<T, MalformedMessage>;

/// A DNS message that is truncated or internally inconsistent.
///
/// Each variant names the field whose declared length could not be honored
/// and the byte offset where reading it started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedMessage {
    /// Fewer than 12 bytes, so not even a header.
    #[error("Message too short for DNS header: {len} bytes")]
    ShortHeader { len: usize },

    /// A name ran off the end of the buffer before a terminator or pointer.
    #[error("Unterminated name starting at offset {offset}")]
    UnterminatedName { offset: usize },

    /// A label declared more bytes than remain.
    #[error("Label of {len} bytes at offset {offset} overruns the message")]
    LabelOverrun { offset: usize, len: usize },

    /// A label length byte used a reserved `01` or `10` prefix.
    #[error("Reserved label type 0x{byte:02x} at offset {offset}")]
    ReservedLabelType { offset: usize, byte: u8 },

    /// A compression pointer was cut off after its first byte.
    #[error("Truncated compression pointer at offset {offset}")]
    TruncatedPointer { offset: usize },

    /// A question lacked its QTYPE/QCLASS.
    #[error("Question at offset {offset} is missing type and class")]
    ShortQuestion { offset: usize },

    /// An answer lacked its TYPE/CLASS/TTL/RDLENGTH block.
    #[error("Answer at offset {offset} is missing its fixed fields")]
    ShortAnswer { offset: usize },

    /// RDLENGTH declared more bytes than remain.
    #[error("RDLENGTH {rdlength} at offset {offset} overruns the message")]
    RdataOverrun { offset: usize, rdlength: usize },

    /// A character-string inside TXT RDATA overran its record.
    #[error("TXT segment of {len} bytes at offset {offset} overruns its record")]
    SegmentOverrun { offset: usize, len: usize },
}
