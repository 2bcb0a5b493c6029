#![doc = r#"
Meta events (`FF <type> <len:vlq> <data>`).

Only the events the crate acts on are decoded. Everything else is kept as
[`MetaMessage::Other`] with its payload untouched, so a file can be read and
written back without losing a sequencer's private events.
"#]

use std::borrow::Cow;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::Tempo;

/// The text-carrying meta types `FF 01` through `FF 07`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum TextKind {
    /// `FF 01`
    Text = 0x01,
    /// `FF 02`
    Copyright = 0x02,
    /// `FF 03`
    TrackName = 0x03,
    /// `FF 04`
    InstrumentName = 0x04,
    /// `FF 05`
    Lyric = 0x05,
    /// `FF 06`
    Marker = 0x06,
    /// `FF 07`
    CuePoint = 0x07,
}

/// Meta type of end-of-track.
pub const END_OF_TRACK: u8 = 0x2F;
/// Meta type of a tempo change.
pub const SET_TEMPO: u8 = 0x51;

/// A decoded meta event.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MetaMessage<'a> {
    /// Any of the text events. The bytes are not required to be UTF-8.
    Text(TextKind, Cow<'a, [u8]>),
    /// `FF 51 03 tt tt tt`
    Tempo(Tempo),
    /// `FF 2F 00`
    EndOfTrack,
    /// Any other meta event, kept verbatim.
    Other {
        /// The meta type byte
        subtype: u8,
        /// The payload
        data: Cow<'a, [u8]>,
    },
}

impl<'a> MetaMessage<'a> {
    /// Interprets a meta event payload.
    ///
    /// A tempo event with a payload other than three bytes is kept as
    /// [`MetaMessage::Other`] rather than rejected.
    pub fn from_parts(subtype: u8, data: &'a [u8]) -> Self {
        if let Ok(kind) = TextKind::try_from_primitive(subtype) {
            return Self::Text(kind, Cow::Borrowed(data));
        }
        match (subtype, data) {
            (END_OF_TRACK, _) => Self::EndOfTrack,
            (SET_TEMPO, &[a, b, c]) => Self::Tempo(Tempo::from_bytes([a, b, c])),
            _ => Self::Other {
                subtype,
                data: Cow::Borrowed(data),
            },
        }
    }

    /// A `FF 01` text event.
    pub fn text(text: impl Into<String>) -> MetaMessage<'static> {
        MetaMessage::Text(TextKind::Text, Cow::Owned(text.into().into_bytes()))
    }

    /// A `FF 06` marker.
    pub fn marker(text: impl Into<String>) -> MetaMessage<'static> {
        MetaMessage::Text(TextKind::Marker, Cow::Owned(text.into().into_bytes()))
    }

    /// The meta type byte.
    pub fn subtype(&self) -> u8 {
        match self {
            Self::Text(kind, _) => (*kind).into(),
            Self::Tempo(_) => SET_TEMPO,
            Self::EndOfTrack => END_OF_TRACK,
            Self::Other { subtype, .. } => *subtype,
        }
    }

    /// The payload as written to a file.
    pub fn payload(&self) -> Cow<'_, [u8]> {
        match self {
            Self::Text(_, data) | Self::Other { data, .. } => Cow::Borrowed(data.as_ref()),
            Self::Tempo(tempo) => Cow::Owned(tempo.to_bytes().to_vec()),
            Self::EndOfTrack => Cow::Borrowed(&[]),
        }
    }

    /// The text of a text event of `kind`, lossily decoded.
    pub fn text_of(&self, kind: TextKind) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(k, data) if *k == kind => Some(String::from_utf8_lossy(data)),
            _ => None,
        }
    }

    /// Detaches the message from the buffer it was read from.
    pub fn into_owned(self) -> MetaMessage<'static> {
        match self {
            Self::Text(kind, data) => MetaMessage::Text(kind, Cow::Owned(data.into_owned())),
            Self::Tempo(tempo) => MetaMessage::Tempo(tempo),
            Self::EndOfTrack => MetaMessage::EndOfTrack,
            Self::Other { subtype, data } => MetaMessage::Other {
                subtype,
                data: Cow::Owned(data.into_owned()),
            },
        }
    }
}

#[test]
fn unknown_meta_is_kept_verbatim() {
    let data = [0x00, 0x20, 0x7F];
    let meta = MetaMessage::from_parts(0x7F, &data);
    assert_eq!(meta.subtype(), 0x7F);
    assert_eq!(meta.payload().as_ref(), &data);
}

#[test]
fn text_kinds() {
    let meta = MetaMessage::from_parts(0x06, b"verse");
    assert_eq!(meta.text_of(TextKind::Marker).as_deref(), Some("verse"));
    assert_eq!(meta.text_of(TextKind::Text), None);
    assert_eq!(MetaMessage::marker("verse"), meta.into_owned());
}

#[test]
fn short_tempo_is_not_a_tempo() {
    assert!(matches!(
        MetaMessage::from_parts(SET_TEMPO, &[0x07, 0xA1]),
        MetaMessage::Other { subtype: SET_TEMPO, .. }
    ));
    assert_eq!(
        MetaMessage::from_parts(SET_TEMPO, &[0x07, 0xA1, 0x20]),
        MetaMessage::Tempo(Tempo::DEFAULT)
    );
}
