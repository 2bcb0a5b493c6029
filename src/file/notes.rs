use std::collections::{HashMap, VecDeque};

use super::TrackEvent;
use crate::note::NoteEvent;

/// Pairs note-ons with note-offs into [`NoteEvent`]s.
///
/// Pairing is first-in first-out per `(channel, key)`, so overlapping notes of
/// the same pitch close in the order they opened. A note-off with nothing open
/// is ignored. Notes still open at the end are closed at `end_tick`.
///
/// The result is ordered by onset, then pitch.
pub fn pair_notes(events: &[TrackEvent<'_>], end_tick: u32) -> Vec<NoteEvent> {
    let mut open: HashMap<(u8, u8), VecDeque<(u32, u8)>> = HashMap::new();
    let mut notes = Vec::new();

    for event in events {
        let message = event.message();
        if let Some((channel, key, velocity)) = message.as_note_on() {
            open.entry((channel, key))
                .or_default()
                .push_back((event.tick(), velocity));
        } else if let Some((channel, key)) = message.as_note_off() {
            match open.get_mut(&(channel, key)).and_then(VecDeque::pop_front) {
                Some((start, velocity)) => {
                    notes.push(NoteEvent::new(key, start, event.tick() - start, velocity));
                }
                None => tracing::trace!(channel, key, tick = event.tick(), "stray note-off"),
            }
        }
    }

    let dangling: usize = open.values().map(VecDeque::len).sum();
    if dangling > 0 {
        tracing::debug!(dangling, end_tick, "closing unterminated notes");
    }
    for ((_, key), starts) in open {
        for (start, velocity) in starts {
            notes.push(NoteEvent::new(
                key,
                start,
                end_tick.saturating_sub(start),
                velocity,
            ));
        }
    }

    notes.sort_by_key(|n| (n.start_tick, n.pitch, n.duration_ticks));
    notes
}
