//! RFC 1035 message walking and TXT extraction.
//!
//! ```text
//!  header   | ID | FLAGS | QDCOUNT | ANCOUNT | NSCOUNT | ARCOUNT |   12 bytes
//!  question | QNAME | QTYPE | QCLASS |                        name + 4 bytes
//!  answer   | NAME | TYPE | CLASS | TTL | RDLENGTH | RDATA |   name + 10 + RDLENGTH
//! ```
//!
//! Authority and additional sections are never reached: decoding stops
//! after the last answer.

use crate::LOG_TARGET;
use crate::error::{MalformedMessage, Result};
use crate::reader::Reader;

/// Length of the fixed DNS header.
pub const HEADER_LEN: usize = 12;

/// Record type code for TXT.
pub const TYPE_TXT: u16 = 16;

/// Class code for IN.
pub const CLASS_IN: u16 = 1;

const QUESTION_FIXED_LEN: usize = 4;
const ANSWER_FIXED_LEN: usize = 10;
const POINTER_TAG: u8 = 0xC0;

/// The fixed DNS message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Query identifier.
    pub id: u16,
    /// Raw flags word.
    pub flags: u16,
    /// Number of questions.
    pub qdcount: u16,
    /// Number of answers.
    pub ancount: u16,
    /// Number of authority records.
    pub nscount: u16,
    /// Number of additional records.
    pub arcount: u16,
}

impl Header {
    /// Whether the QR bit marks this as a response.
    pub fn is_response(&self) -> bool {
        self.flags & 0x8000 != 0
    }

    /// Whether the TC bit is set.
    pub fn is_truncated(&self) -> bool {
        self.flags & 0x0200 != 0
    }

    /// The 4-bit response code.
    pub fn rcode(&self) -> u8 {
        (self.flags & 0x000F) as u8
    }
}

/// TXT segments extracted from a DNS response, in message order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    header: Header,
    segments: Vec<String>,
}

impl DecodedMessage {
    /// The message header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The decoded TXT segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Consume the message, keeping only the segments.
    pub fn into_segments(self) -> Vec<String> {
        self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl IntoIterator for DecodedMessage {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

/// Decode a raw DNS response into its header and TXT segments.
///
/// Each character-string of every IN-class TXT answer becomes one segment.
/// Segments are decoded as UTF-8 with invalid sequences replaced. Any
/// length field that cannot be honored fails the whole decode.
pub fn decode(bytes: &[u8]) -> Result<DecodedMessage> {
    let _span = tracing::debug_span!(target: LOG_TARGET, "decode_txt", len = bytes.len()).entered();
    let mut reader = Reader::new(bytes);

    let header = read_header(&mut reader, bytes.len())?;

    for _ in 0..header.qdcount {
        skip_name(&mut reader)?;
        let offset = reader.offset();
        reader
            .skip(QUESTION_FIXED_LEN)
            .ok_or(MalformedMessage::ShortQuestion { offset })?;
    }

    let mut segments = Vec::new();
    for _ in 0..header.ancount {
        skip_name(&mut reader)?;

        let offset = reader.offset();
        if reader.remaining() < ANSWER_FIXED_LEN {
            return Err(MalformedMessage::ShortAnswer { offset });
        }
        let short = || MalformedMessage::ShortAnswer { offset };
        let rtype = reader.read_u16().ok_or_else(short)?;
        let class = reader.read_u16().ok_or_else(short)?;
        let _ttl = reader.read_u32().ok_or_else(short)?;
        let rdlength = reader.read_u16().ok_or_else(short)? as usize;

        let rdata_offset = reader.offset();
        let rdata = reader
            .sub_reader(rdlength)
            .ok_or(MalformedMessage::RdataOverrun {
                offset: rdata_offset,
                rdlength,
            })?;

        if rtype == TYPE_TXT && class == CLASS_IN {
            read_character_strings(rdata, &mut segments)?;
        } else {
            tracing::trace!(target: LOG_TARGET, rtype, class, rdlength, "skipping non-TXT answer");
        }
    }

    tracing::trace!(
        target: LOG_TARGET,
        id = header.id,
        rcode = header.rcode(),
        answers = header.ancount,
        segments = segments.len(),
        "decoded DNS response"
    );

    Ok(DecodedMessage { header, segments })
}

/// Decode a raw DNS response into its TXT segments only.
pub fn decode_txt_records(bytes: &[u8]) -> Result<Vec<String>> {
    decode(bytes).map(DecodedMessage::into_segments)
}

fn read_header(reader: &mut Reader<'_>, len: usize) -> Result<Header> {
    let short = || MalformedMessage::ShortHeader { len };
    if reader.remaining() < HEADER_LEN {
        return Err(short());
    }
    Ok(Header {
        id: reader.read_u16().ok_or_else(short)?,
        flags: reader.read_u16().ok_or_else(short)?,
        qdcount: reader.read_u16().ok_or_else(short)?,
        ancount: reader.read_u16().ok_or_else(short)?,
        nscount: reader.read_u16().ok_or_else(short)?,
        arcount: reader.read_u16().ok_or_else(short)?,
    })
}

/// Advance past one encoded name.
///
/// A compression pointer ends the name after its second byte; its target is
/// not visited, since only the bytes occupied at the current position matter.
fn skip_name(reader: &mut Reader<'_>) -> Result<()> {
    let start = reader.offset();
    loop {
        let offset = reader.offset();
        let len = reader
            .read_u8()
            .ok_or(MalformedMessage::UnterminatedName { offset: start })?;

        if len == 0 {
            return Ok(());
        }
        match len & POINTER_TAG {
            POINTER_TAG => {
                reader
                    .skip(1)
                    .ok_or(MalformedMessage::TruncatedPointer { offset })?;
                return Ok(());
            }
            0 => {
                let len = len as usize;
                reader
                    .skip(len)
                    .ok_or(MalformedMessage::LabelOverrun { offset, len })?;
            }
            _ => return Err(MalformedMessage::ReservedLabelType { offset, byte: len }),
        }
    }
}

/// Split TXT RDATA into its length-prefixed character-strings.
fn read_character_strings(mut rdata: Reader<'_>, out: &mut Vec<String>) -> Result<()> {
    while !rdata.is_empty() {
        let offset = rdata.offset();
        let len = match rdata.read_u8() {
            Some(len) => len as usize,
            None => break,
        };
        let bytes = rdata
            .take(len)
            .ok_or(MalformedMessage::SegmentOverrun { offset, len })?;
        out.push(String::from_utf8_lossy(bytes).into_owned());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(qdcount: u16, ancount: u16) -> Vec<u8> {
        let mut buf = vec![0xab, 0xcd, 0x81, 0x80];
        buf.extend_from_slice(&qdcount.to_be_bytes());
        buf.extend_from_slice(&ancount.to_be_bytes());
        buf.extend_from_slice(&[0, 0, 0, 0]);
        buf
    }

    #[test]
    fn test_header_only() {
        let message = decode(&header(0, 0)).unwrap();
        assert!(message.is_empty());
        assert_eq!(message.header().id, 0xabcd);
        assert!(message.header().is_response());
        assert!(!message.header().is_truncated());
        assert_eq!(message.header().rcode(), 0);
    }

    #[test]
    fn test_short_header() {
        assert_eq!(
            decode(&[0; 11]),
            Err(MalformedMessage::ShortHeader { len: 11 })
        );
        assert_eq!(decode(&[]), Err(MalformedMessage::ShortHeader { len: 0 }));
    }

    #[test]
    fn test_skip_name_labels() {
        let bytes = [3, b'w', b'w', b'w', 2, b'i', b'o', 0, 0xff];
        let mut reader = Reader::new(&bytes);
        skip_name(&mut reader).unwrap();
        assert_eq!(reader.offset(), 8);
    }

    #[test]
    fn test_skip_name_pointer_after_label() {
        let bytes = [1, b'a', 0xc0, 0x0c, 0xff];
        let mut reader = Reader::new(&bytes);
        skip_name(&mut reader).unwrap();
        assert_eq!(reader.offset(), 4);
    }

    #[test]
    fn test_skip_name_failures() {
        let mut reader = Reader::new(&[5, b'a', b'b']);
        assert_eq!(
            skip_name(&mut reader),
            Err(MalformedMessage::LabelOverrun { offset: 0, len: 5 })
        );

        let mut reader = Reader::new(&[1, b'a']);
        assert_eq!(
            skip_name(&mut reader),
            Err(MalformedMessage::UnterminatedName { offset: 0 })
        );

        let mut reader = Reader::new(&[0xc0]);
        assert_eq!(
            skip_name(&mut reader),
            Err(MalformedMessage::TruncatedPointer { offset: 0 })
        );

        let mut reader = Reader::new(&[0x41, 0, 0]);
        assert_eq!(
            skip_name(&mut reader),
            Err(MalformedMessage::ReservedLabelType {
                offset: 0,
                byte: 0x41
            })
        );
    }

    #[test]
    fn test_character_strings_empty_segment() {
        let mut out = Vec::new();
        read_character_strings(Reader::new(&[0, 1, b'x']), &mut out).unwrap();
        assert_eq!(out, vec![String::new(), "x".to_string()]);
    }

    #[test]
    fn test_character_strings_invalid_utf8_is_replaced() {
        let mut out = Vec::new();
        read_character_strings(Reader::new(&[2, 0xff, b'a']), &mut out).unwrap();
        assert_eq!(out, vec!["\u{fffd}a".to_string()]);
    }
}
