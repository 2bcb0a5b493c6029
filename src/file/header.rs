use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    HeaderError,
    reader::{ReadResult, Reader, ReaderError},
};

#[doc = r#"
The `format` word of the header.

Format 0 holds one multi-channel track; format 1 holds simultaneous tracks;
format 2 holds independent sequences. For note extraction all three are merged
onto a single timeline.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum FormatType {
    /// Format 0
    SingleMultiChannel = 0,
    /// Format 1
    Simultaneous = 1,
    /// Format 2
    SequentiallyIndependent = 2,
}

#[doc = r#"
The contents of the `MThd` chunk.

```text
MThd <len:u32 = 6> <format:u16> <ntracks:u16> <division:u16>
```

Only ticks-per-quarter-note division is supported. A set top bit selects SMPTE
timing and is rejected with [`HeaderError::SmpteTiming`].
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiFileHeader {
    format: FormatType,
    num_tracks: u16,
    ppq: u16,
}

impl MidiFileHeader {
    /// Create a new header
    pub const fn new(format: FormatType, num_tracks: u16, ppq: u16) -> Self {
        Self {
            format,
            num_tracks,
            ppq,
        }
    }

    /// Parses the data of an `MThd` chunk. `offset` is the absolute position of
    /// `data` and is only used for error reporting.
    pub(crate) fn read(data: &[u8], offset: usize) -> ReadResult<Self> {
        if data.len() < 6 {
            return Err(ReaderError::parse_error(
                offset,
                HeaderError::Length(data.len() as u32),
            ));
        }
        let mut reader = Reader::from_byte_slice(data);
        let format = reader.read_u16_be()?;
        let num_tracks = reader.read_u16_be()?;
        let division = reader.read_u16_be()?;

        let format = FormatType::try_from_primitive(format)
            .map_err(|_| ReaderError::parse_error(offset, HeaderError::InvalidFormat(format)))?;
        if division & 0x8000 != 0 {
            return Err(ReaderError::parse_error(
                offset + 4,
                HeaderError::SmpteTiming(division),
            ));
        }
        if division == 0 {
            return Err(ReaderError::parse_error(offset + 4, HeaderError::ZeroDivision));
        }
        Ok(Self::new(format, num_tracks, division))
    }

    /// The six data bytes of the `MThd` chunk.
    pub fn to_bytes(&self) -> [u8; 6] {
        let [f0, f1] = u16::from(self.format).to_be_bytes();
        let [n0, n1] = self.num_tracks.to_be_bytes();
        let [d0, d1] = self.ppq.to_be_bytes();
        [f0, f1, n0, n1, d0, d1]
    }

    /// The declared format
    pub const fn format_type(&self) -> FormatType {
        self.format
    }
    /// The declared number of tracks
    pub const fn num_tracks(&self) -> u16 {
        self.num_tracks
    }
    /// Ticks per quarter note
    pub const fn ppq(&self) -> u16 {
        self.ppq
    }
}

#[test]
fn header_round_trips_its_bytes() {
    let header = MidiFileHeader::new(FormatType::Simultaneous, 3, 960);
    assert_eq!(MidiFileHeader::read(&header.to_bytes(), 8), Ok(header));
}

#[test]
fn smpte_and_bad_formats_are_rejected() {
    use crate::{ParseError, reader::ReaderErrorKind};
    let err = MidiFileHeader::read(&[0, 0, 0, 1, 0xE7, 0x28], 8).unwrap_err();
    assert_eq!(
        err.error_kind(),
        &ReaderErrorKind::ParseError(ParseError::Header(HeaderError::SmpteTiming(0xE728)))
    );
    assert_eq!(err.position(), 12);

    let err = MidiFileHeader::read(&[0, 3, 0, 1, 0x01, 0xE0], 8).unwrap_err();
    assert_eq!(
        err.error_kind(),
        &ReaderErrorKind::ParseError(ParseError::Header(HeaderError::InvalidFormat(3)))
    );
    assert!(MidiFileHeader::read(&[0, 0, 0, 1], 8).is_err());
}
