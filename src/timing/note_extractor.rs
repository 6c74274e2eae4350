//! Pairing of note-on/note-off events into discrete timed notes.

use crate::error::MidiSlideError;
use crate::parser::event_parser::{ChannelMessage, TrackEvent};
use crate::parser::midi_parser::StandardMidiFile;
use serde::Serialize;

/// A note paired from a note-on and its closing event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct MidiNote {
    pub key: u8,
    pub velocity: u8,
    pub duration_in_ticks: u64,
    pub ticks_from_start: u64,
}

impl MidiNote {
    /// Tick at which the note stops sounding.
    pub const fn end_tick(&self) -> u64 {
        self.ticks_from_start + self.duration_in_ticks
    }

    /// The zero-duration marker appended after the last real note.
    const fn terminal(at_tick: u64) -> Self {
        Self {
            key: 0,
            velocity: 0,
            duration_in_ticks: 0,
            ticks_from_start: at_tick,
        }
    }
}

/// A note event flattened for pairing: (tick, is note-on, key, velocity).
type NoteEvent = (u64, bool, u8, u8);

/// Extract the ordered note list from a parsed file.
///
/// Tracks of a format-1 file are concatenated in file order, not merged by
/// time; concurrent notes across tracks are not supported here. A note-on
/// must be closed by the next note event: a note-off or a velocity-0
/// note-on on the same key. A trailing zero-duration marker note is always
/// appended at the end tick of the last real note.
pub fn extract_notes(file: &StandardMidiFile) -> Result<Vec<MidiNote>, MidiSlideError> {
    let note_events: Vec<NoteEvent> = file
        .events()
        .filter_map(|event| match event {
            TrackEvent::Channel {
                tick,
                message: ChannelMessage::NoteOn { key, velocity },
            } => Some((*tick, true, *key, *velocity)),
            TrackEvent::Channel {
                tick,
                message: ChannelMessage::NoteOff { key, velocity },
            } => Some((*tick, false, *key, *velocity)),
            _ => None,
        })
        .collect();

    if note_events.len() % 2 != 0 {
        return Err(MidiSlideError::OddNoteEventCount(note_events.len()));
    }

    let mut notes = Vec::with_capacity(note_events.len() / 2 + 1);
    // (start tick, key, velocity) of the currently sounding note
    let mut open: Option<(u64, u8, u8)> = None;

    for (tick, is_on, key, velocity) in note_events {
        match open {
            None if is_on => open = Some((tick, key, velocity)),
            None => {
                return Err(MidiSlideError::MalformedInput(format!(
                    "note-off for key {key} without a matching note-on"
                )));
            }
            // a second sounding note is overlap, a velocity-0 note-on closes
            Some((_, open_key, _)) if is_on && velocity > 0 => {
                return Err(MidiSlideError::OverlappingNote {
                    open: open_key,
                    incoming: key,
                });
            }
            Some((start, open_key, open_velocity)) => {
                if key != open_key {
                    return Err(MidiSlideError::MismatchedNoteKey {
                        opening: open_key,
                        closing: key,
                    });
                }
                let duration = tick.checked_sub(start).ok_or_else(|| {
                    MidiSlideError::MalformedInput(format!(
                        "note on key {key} closes at tick {tick}, before it started at {start}"
                    ))
                })?;
                notes.push(MidiNote {
                    key: open_key,
                    velocity: open_velocity,
                    duration_in_ticks: duration,
                    ticks_from_start: start,
                });
                open = None;
            }
        }
    }

    let end_tick = notes.last().map_or(0, MidiNote::end_tick);
    notes.push(MidiNote::terminal(end_tick));
    Ok(notes)
}
