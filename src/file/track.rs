#![doc = r#"
Track chunk bodies.

An `MTrk` body is a sequence of `<delta:vlq> <event>` pairs. Events are one of

- a channel message, possibly using running status (the status byte is
  omitted and the previous one reused),
- a SysEx message, `F0 <len:vlq> <data>` or the escape form `F7 <len:vlq> <data>`,
- a meta event, `FF <type> <len:vlq> <data>`.

Delta times are accumulated into absolute ticks as the track is read. Parsing
stops at end-of-track; bytes after it are ignored.
"#]

use std::borrow::Cow;

use super::MetaMessage;
use crate::{
    TrackError,
    reader::{ReadResult, Reader, ReaderError},
};

/// A message on a track, stripped of its delta time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TrackMessage<'a> {
    /// `9n kk vv`
    NoteOn {
        /// 0..16
        channel: u8,
        /// 0..128
        key: u8,
        /// 0..128. Zero means note-off.
        velocity: u8,
    },
    /// `8n kk vv`
    NoteOff {
        /// 0..16
        channel: u8,
        /// 0..128
        key: u8,
        /// Release velocity
        velocity: u8,
    },
    /// Any other channel message, kept so files can be inspected.
    Channel {
        /// The full status byte
        status: u8,
        /// One or two data bytes
        data: Cow<'a, [u8]>,
    },
    /// A SysEx or escape sequence, payload without its framing.
    SysEx(Cow<'a, [u8]>),
    /// A meta event.
    Meta(MetaMessage<'a>),
}

impl<'a> TrackMessage<'a> {
    /// Note-on with non-zero velocity: `(channel, key, velocity)`.
    pub const fn as_note_on(&self) -> Option<(u8, u8, u8)> {
        match *self {
            Self::NoteOn {
                channel,
                key,
                velocity,
            } if velocity > 0 => Some((channel, key, velocity)),
            _ => None,
        }
    }

    /// Note-off, or note-on with velocity zero: `(channel, key)`.
    pub const fn as_note_off(&self) -> Option<(u8, u8)> {
        match *self {
            Self::NoteOff { channel, key, .. }
            | Self::NoteOn {
                channel,
                key,
                velocity: 0,
            } => Some((channel, key)),
            _ => None,
        }
    }

    /// The meta event, if this is one.
    pub const fn as_meta(&self) -> Option<&MetaMessage<'a>> {
        match self {
            Self::Meta(meta) => Some(meta),
            _ => None,
        }
    }
}

/// A message at an absolute tick.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrackEvent<'a> {
    tick: u32,
    message: TrackMessage<'a>,
}

impl<'a> TrackEvent<'a> {
    /// Create a new event
    pub const fn new(tick: u32, message: TrackMessage<'a>) -> Self {
        Self { tick, message }
    }
    /// Ticks since the start of the track
    pub const fn tick(&self) -> u32 {
        self.tick
    }
    /// The message
    pub const fn message(&self) -> &TrackMessage<'a> {
        &self.message
    }
}

/// A parsed `MTrk` chunk.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Track<'a> {
    events: Vec<TrackEvent<'a>>,
}

impl<'a> Track<'a> {
    /// Create a track from events in tick order.
    pub fn new(events: Vec<TrackEvent<'a>>) -> Self {
        Self { events }
    }

    /// Parses a track body. `offset` is the absolute position of `data`.
    pub fn parse(data: &'a [u8], offset: usize) -> ReadResult<Self> {
        let mut reader = Reader::from_byte_slice(data);
        let mut events = Vec::new();
        let mut tick: u32 = 0;
        let mut running_status: Option<u8> = None;

        while !reader.is_empty() {
            let delta = reader.read_vlq().map_err(|e| shift(e, offset))?;
            tick = tick.saturating_add(delta);
            let message =
                read_message(&mut reader, &mut running_status).map_err(|e| shift(e, offset))?;
            let end = matches!(message, TrackMessage::Meta(MetaMessage::EndOfTrack));
            events.push(TrackEvent::new(tick, message));
            if end {
                break;
            }
        }
        Ok(Self { events })
    }

    /// Events in tick order.
    pub fn events(&self) -> &[TrackEvent<'a>] {
        &self.events
    }

    /// The tick of the last event, end-of-track included.
    pub fn end_tick(&self) -> u32 {
        self.events.last().map_or(0, |e| e.tick)
    }
}

fn shift(error: ReaderError, offset: usize) -> ReaderError {
    ReaderError::new(error.position() + offset, error.kind)
}

fn read_message<'a>(
    reader: &mut Reader<'a>,
    running_status: &mut Option<u8>,
) -> ReadResult<TrackMessage<'a>> {
    let position = reader.buffer_position();
    let first = reader.peek_u8()?;
    let status = if first & 0x80 != 0 {
        reader.read_u8()?
    } else {
        running_status.ok_or(ReaderError::parse_error(
            position,
            TrackError::NoRunningStatus(first),
        ))?
    };

    match status {
        0x80..=0xEF => {
            *running_status = Some(status);
            let channel = status & 0x0F;
            let len = match status & 0xF0 {
                0xC0 | 0xD0 => 1,
                _ => 2,
            };
            let data = reader.read_slice(len)?;
            Ok(match (status & 0xF0, data) {
                (0x90, &[key, velocity]) => TrackMessage::NoteOn {
                    channel,
                    key,
                    velocity,
                },
                (0x80, &[key, velocity]) => TrackMessage::NoteOff {
                    channel,
                    key,
                    velocity,
                },
                _ => TrackMessage::Channel {
                    status,
                    data: Cow::Borrowed(data),
                },
            })
        }
        0xF0 | 0xF7 => {
            let len = reader.read_vlq()? as usize;
            Ok(TrackMessage::SysEx(Cow::Borrowed(reader.read_slice(len)?)))
        }
        0xFF => {
            let subtype = reader.read_u8()?;
            let len = reader.read_vlq()? as usize;
            let data = reader.read_slice(len)?;
            Ok(TrackMessage::Meta(MetaMessage::from_parts(subtype, data)))
        }
        other => Err(ReaderError::parse_error(
            position,
            TrackError::UnexpectedStatus(other),
        )),
    }
}
