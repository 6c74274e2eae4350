//! Tick-to-seconds conversion from the header division and tempo metadata.

use crate::error::MidiSlideError;
use crate::parser::event_parser::{META_SET_TEMPO, TrackEvent};
use crate::parser::midi_parser::{Division, StandardMidiFile};

/// Tempo assumed when the file carries no set-tempo event (120 BPM).
pub const DEFAULT_MICROS_PER_QUARTER_NOTE: u32 = 500_000;

const MICROS_PER_SEC: f64 = 1_000_000.0;

/// Compute the wall-clock duration of one tick in seconds.
///
/// Only a single constant tempo is supported; a tempo map fails with
/// [`MidiSlideError::MultipleTempoEvents`].
pub fn resolve_timebase(file: &StandardMidiFile) -> Result<f64, MidiSlideError> {
    let mut tempos = Vec::new();
    for event in file.events() {
        if let TrackEvent::Meta {
            meta_type: META_SET_TEMPO,
            data,
            ..
        } = event
        {
            tempos.push(tempo_value(data)?);
        }
    }
    if tempos.len() > 1 {
        return Err(MidiSlideError::MultipleTempoEvents(tempos.len()));
    }

    let Division::TicksPerQuarterNote(ticks_per_quarter) = file.header.division else {
        return Err(MidiSlideError::UnsupportedDivision);
    };

    let micros_per_quarter = tempos
        .first()
        .copied()
        .unwrap_or(DEFAULT_MICROS_PER_QUARTER_NOTE);
    log::debug!("timebase: {micros_per_quarter} us/quarter at {ticks_per_quarter} ticks/quarter");
    Ok(f64::from(micros_per_quarter) / (MICROS_PER_SEC * f64::from(ticks_per_quarter)))
}

/// Decode a set-tempo payload: 3-byte big-endian microseconds per quarter note.
fn tempo_value(data: &[u8]) -> Result<u32, MidiSlideError> {
    match data {
        [high, mid, low] => {
            Ok((u32::from(*high) << 16) | (u32::from(*mid) << 8) | u32::from(*low))
        }
        _ => Err(MidiSlideError::MalformedInput(format!(
            "set-tempo payload of {} bytes, expected 3",
            data.len()
        ))),
    }
}
