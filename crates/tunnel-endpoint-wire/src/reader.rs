//! Bounds-checked cursor over an untrusted byte buffer.

/// A forward-only cursor that never reads past the end of its slice.
///
/// Every accessor returns `None` instead of panicking when the request
/// exceeds what remains. Offsets reported by [`offset`](Self::offset) are
/// absolute within the original message, including for sub-readers.
#[derive(Debug, Clone)]
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            base: 0,
        }
    }

    /// Absolute offset of the next unread byte.
    pub(crate) fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Option<()> {
        self.take(n).map(|_| ())
    }

    pub(crate) fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    pub(crate) fn read_u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn read_u32(&mut self) -> Option<u32> {
        self.take(4).map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Split off the next `n` bytes as an independent reader and advance
    /// past them.
    pub(crate) fn sub_reader(&mut self, n: usize) -> Option<Reader<'a>> {
        let base = self.offset();
        let buf = self.take(n)?;
        Some(Reader { buf, pos: 0, base })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_big_endian() {
        let mut reader = Reader::new(&[0x12, 0x34, 0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(reader.read_u16(), Some(0x1234));
        assert_eq!(reader.read_u32(), Some(0xdead_beef));
        assert!(reader.is_empty());
    }

    #[test]
    fn test_short_reads_do_not_advance() {
        let mut reader = Reader::new(&[0x01]);
        assert_eq!(reader.read_u16(), None);
        assert_eq!(reader.offset(), 0);
        assert_eq!(reader.read_u8(), Some(0x01));
        assert_eq!(reader.read_u8(), None);
    }

    #[test]
    fn test_take_huge_length() {
        let mut reader = Reader::new(&[0; 4]);
        reader.skip(1).unwrap();
        assert_eq!(reader.take(usize::MAX), None);
        assert_eq!(reader.remaining(), 3);
    }

    #[test]
    fn test_sub_reader_keeps_absolute_offsets() {
        let mut reader = Reader::new(&[9, 9, 1, 2, 3, 7]);
        reader.skip(2).unwrap();
        let mut sub = reader.sub_reader(3).unwrap();
        assert_eq!(sub.offset(), 2);
        assert_eq!(sub.read_u8(), Some(1));
        assert_eq!(sub.offset(), 3);
        assert_eq!(sub.take(3), None);
        assert_eq!(reader.read_u8(), Some(7));
    }
}
