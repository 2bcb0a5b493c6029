#![doc = r#"
A bounds-checked cursor over a borrowed byte buffer.

Every container and codec in this crate is a reader of some slice. [`Reader`]
tracks the absolute position so that failures can be reported with the offset
that caused them, and it never panics on short input: reading past the end of
the buffer yields [`ReaderErrorKind::OutOfBounds`].
"#]

mod error;
pub use error::*;

/// A cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'slc> {
    data: &'slc [u8],
    position: usize,
}

impl<'slc> Reader<'slc> {
    /// Create a reader at the start of `data`.
    pub const fn from_byte_slice(data: &'slc [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Create a reader positioned at `offset`.
    pub const fn at(data: &'slc [u8], offset: usize) -> Self {
        Self {
            data,
            position: offset,
        }
    }

    /// The absolute offset of the next byte to be read.
    #[inline]
    pub const fn buffer_position(&self) -> usize {
        self.position
    }

    /// Bytes left before the end of the buffer.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// True when no bytes are left.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The whole underlying buffer.
    pub const fn buffer(&self) -> &'slc [u8] {
        self.data
    }

    /// Moves the cursor forward by `len` bytes.
    pub fn skip(&mut self, len: usize) -> ReadResult<()> {
        self.read_slice(len).map(|_| ())
    }

    /// Reads `len` bytes, borrowing them from the underlying buffer.
    pub fn read_slice(&mut self, len: usize) -> ReadResult<&'slc [u8]> {
        let end = self
            .position
            .checked_add(len)
            .ok_or(ReaderError::oob(self.position))?;
        let slice = self
            .data
            .get(self.position..end)
            .ok_or(ReaderError::oob(self.position))?;
        self.position = end;
        Ok(slice)
    }

    /// Reads a fixed number of bytes.
    pub fn read_exact_size<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let slice = self.read_slice(N)?;
        let mut out = [0; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Reads the next byte without consuming it.
    pub fn peek_u8(&self) -> ReadResult<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(ReaderError::oob(self.position))
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> ReadResult<u8> {
        let byte = self.peek_u8()?;
        self.position += 1;
        Ok(byte)
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16_be(&mut self) -> ReadResult<u16> {
        self.read_exact_size().map(u16::from_be_bytes)
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32_be(&mut self) -> ReadResult<u32> {
        self.read_exact_size().map(u32::from_be_bytes)
    }

    /// Reads a big-endian `u64`.
    pub fn read_u64_be(&mut self) -> ReadResult<u64> {
        self.read_exact_size().map(u64::from_be_bytes)
    }

    /// Reads a MIDI variable-length quantity.
    ///
    /// Base-128 big-endian, continuation bit on every byte but the last.
    /// At most four bytes are accepted, giving a 28-bit value.
    pub fn read_vlq(&mut self) -> ReadResult<u32> {
        let start = self.position;
        let mut value: u32 = 0;
        for _ in 0..4 {
            let byte = self.read_u8()?;
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ReaderError::parse_error(
            start,
            crate::TrackError::VlqTooLong,
        ))
    }
}

/// Writes `value` as a MIDI variable-length quantity.
pub fn write_vlq(value: u32, out: &mut Vec<u8>) {
    let mut buf = [0u8; 5];
    let mut idx = buf.len() - 1;
    let mut rest = value;
    buf[idx] = (rest & 0x7F) as u8;
    rest >>= 7;
    while rest > 0 {
        idx -= 1;
        buf[idx] = ((rest & 0x7F) as u8) | 0x80;
        rest >>= 7;
    }
    out.extend_from_slice(&buf[idx..]);
}

#[test]
fn vlq_matches_reference_encodings() {
    use pretty_assertions::assert_eq;
    let cases: [(u32, &[u8]); 6] = [
        (0x00, &[0x00]),
        (0x7F, &[0x7F]),
        (0x80, &[0x81, 0x00]),
        (0x2000, &[0xC0, 0x00]),
        (0x3FFF, &[0xFF, 0x7F]),
        (0x0FFF_FFFF, &[0xFF, 0xFF, 0xFF, 0x7F]),
    ];
    for (value, bytes) in cases {
        let mut out = Vec::new();
        write_vlq(value, &mut out);
        assert_eq!(out, bytes);
        assert_eq!(Reader::from_byte_slice(bytes).read_vlq().unwrap(), value);
    }
}

#[test]
fn vlq_rejects_five_byte_quantities() {
    let bytes = [0x81, 0x81, 0x81, 0x81, 0x01];
    let err = Reader::from_byte_slice(&bytes).read_vlq().unwrap_err();
    assert_eq!(err.position(), 0);
    assert!(!err.is_out_of_bounds());
}

#[test]
fn short_reads_are_out_of_bounds() {
    let mut reader = Reader::from_byte_slice(&[0x00, 0x01]);
    let err = reader.read_u32_be().unwrap_err();
    assert!(err.is_out_of_bounds());
    assert_eq!(reader.buffer_position(), 0);
}
