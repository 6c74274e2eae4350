//! Track event decoding: delta times, running status and event payloads.

use crate::error::MidiSlideError;
use crate::parser::primitive_parser::{parse_u8, parse_varlen, take_bytes};

/// End-of-track meta event type.
pub const META_END_OF_TRACK: u8 = 0x2F;
/// Set-tempo meta event type, 3-byte big-endian microseconds per quarter note.
pub const META_SET_TEMPO: u8 = 0x51;

/// A channel voice message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelMessage {
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8, velocity: u8 },
    /// Aftertouch, control change, program change and pitch bend are carried
    /// through without further interpretation.
    Other { status: u8, data: Vec<u8> },
}

/// A single decoded track event at an absolute tick offset from track start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackEvent {
    Channel {
        tick: u64,
        message: ChannelMessage,
    },
    Meta {
        tick: u64,
        meta_type: u8,
        data: Vec<u8>,
    },
    SysEx {
        tick: u64,
        status: u8,
        data: Vec<u8>,
    },
}

impl TrackEvent {
    /// Absolute tick offset from the start of the owning track.
    pub const fn tick(&self) -> u64 {
        match self {
            Self::Channel { tick, .. } | Self::Meta { tick, .. } | Self::SysEx { tick, .. } => {
                *tick
            }
        }
    }
}

fn malformed(message: impl Into<String>) -> MidiSlideError {
    MidiSlideError::MalformedInput(message.into())
}

/// Parse a data byte, which must have its MSB clear.
fn parse_data_byte<'a>(i: &'a [u8], what: &str) -> Result<(&'a [u8], u8), MidiSlideError> {
    let (rest, byte) =
        parse_u8(i).map_err(|_| malformed(format!("track ends before {what} byte")))?;
    if byte > 0x7F {
        return Err(malformed(format!("{what} byte 0x{byte:02X} out of range")));
    }
    Ok((rest, byte))
}

/// Decode a complete track payload into an ordered event list.
///
/// Running status and the cumulative tick are loop-local state, so the
/// decoder can run on independent payloads concurrently. Decoding stops at
/// the end-of-track meta event; any payload bytes after it are ignored.
pub fn decode_track_events(payload: &[u8]) -> Result<Vec<TrackEvent>, MidiSlideError> {
    let mut events = Vec::new();
    let mut i = payload;
    let mut tick: u64 = 0;
    let mut last_status: Option<u8> = None;

    while !i.is_empty() {
        let (rest, delta) =
            parse_varlen(i).map_err(|_| malformed("bad delta time quantity"))?;
        tick += u64::from(delta);

        // a set MSB starts a new status, otherwise the previous one runs on
        // and the peeked byte is the first data byte
        let (rest, status) = match rest.first() {
            Some(byte) if byte & 0x80 != 0 => (&rest[1..], *byte),
            Some(_) => {
                let status =
                    last_status.ok_or_else(|| malformed("data byte without a running status"))?;
                (rest, status)
            }
            None => return Err(malformed("track payload ends after a delta time")),
        };
        last_status = Some(status);

        i = match status >> 4 {
            // note off / note on, data bytes range-checked
            0x8 | 0x9 => {
                let (rest, key) = parse_data_byte(rest, "note key")?;
                let (rest, velocity) = parse_data_byte(rest, "note velocity")?;
                let message = if status >> 4 == 0x9 {
                    ChannelMessage::NoteOn { key, velocity }
                } else {
                    ChannelMessage::NoteOff { key, velocity }
                };
                events.push(TrackEvent::Channel { tick, message });
                rest
            }
            // aftertouch, control change, pitch bend
            0xA | 0xB | 0xE => {
                let (rest, data) = take_bytes(rest, 2)
                    .map_err(|_| malformed("track ends inside a channel message"))?;
                events.push(TrackEvent::Channel {
                    tick,
                    message: ChannelMessage::Other {
                        status,
                        data: data.to_vec(),
                    },
                });
                rest
            }
            // program change, channel pressure
            0xC | 0xD => {
                let (rest, data) = take_bytes(rest, 1)
                    .map_err(|_| malformed("track ends inside a channel message"))?;
                events.push(TrackEvent::Channel {
                    tick,
                    message: ChannelMessage::Other {
                        status,
                        data: data.to_vec(),
                    },
                });
                rest
            }
            0xF => match status {
                0xFF => {
                    let (rest, meta_type) =
                        parse_u8(rest).map_err(|_| malformed("track ends before a meta type"))?;
                    let (rest, length) =
                        parse_u8(rest).map_err(|_| malformed("track ends before a meta length"))?;
                    let (rest, data) = take_bytes(rest, length as usize)
                        .map_err(|_| malformed("track ends inside a meta event"))?;
                    events.push(TrackEvent::Meta {
                        tick,
                        meta_type,
                        data: data.to_vec(),
                    });
                    if meta_type == META_END_OF_TRACK {
                        log::debug!("end of track at tick {tick}");
                        return Ok(events);
                    }
                    rest
                }
                0xF0 | 0xF7 => {
                    let (rest, length) = parse_u8(rest)
                        .map_err(|_| malformed("track ends before a sysex length"))?;
                    let (rest, data) = take_bytes(rest, length as usize)
                        .map_err(|_| malformed("track ends inside a sysex event"))?;
                    events.push(TrackEvent::SysEx {
                        tick,
                        status,
                        data: data.to_vec(),
                    });
                    rest
                }
                other => {
                    return Err(malformed(format!("unknown status byte 0x{other:02X}")));
                }
            },
            nibble => {
                return Err(malformed(format!("unknown status nibble 0x{nibble:X}")));
            }
        };
    }
    Ok(events)
}

/// Best-effort scan of a payload for its end-of-track meta event.
///
/// Returns the byte length of the event stream up to and including the
/// end-of-track event, or `None` when the scan runs off the end or the
/// bytes stop looking like events. Used to settle disagreements between a
/// track chunk's declared length and its actual content.
pub fn scan_track_length(payload: &[u8]) -> Option<usize> {
    let mut i = payload;
    let mut last_status: Option<u8> = None;

    while !i.is_empty() {
        let (rest, _delta) = parse_varlen(i).ok()?;
        let (rest, status) = match rest.first()? {
            byte if byte & 0x80 != 0 => (&rest[1..], *byte),
            _ => (rest, last_status?),
        };
        last_status = Some(status);

        i = match status >> 4 {
            0x8 | 0x9 | 0xA | 0xB | 0xE => rest.get(2..)?,
            0xC | 0xD => rest.get(1..)?,
            0xF => match status {
                0xFF => {
                    let (rest, meta_type) = parse_u8(rest).ok()?;
                    let (rest, length) = parse_u8(rest).ok()?;
                    let rest = rest.get(length as usize..)?;
                    if meta_type == META_END_OF_TRACK {
                        return Some(payload.len() - rest.len());
                    }
                    rest
                }
                0xF0 | 0xF7 => {
                    let (rest, length) = parse_u8(rest).ok()?;
                    rest.get(length as usize..)?
                }
                _ => return None,
            },
            _ => return None,
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_status_reassembly() {
        // note-on, then two more key/velocity pairs reusing the status byte
        let payload = [
            0x00, 0x90, 60, 64, //
            0x10, 62, 64, //
            0x10, 64, 0, //
        ];
        let events = decode_track_events(&payload).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[1],
            TrackEvent::Channel {
                tick: 0x10,
                message: ChannelMessage::NoteOn {
                    key: 62,
                    velocity: 64
                }
            }
        );
        assert_eq!(events[2].tick(), 0x20);
    }

    #[test]
    fn test_data_byte_without_running_status() {
        let payload = [0x00, 0x3C, 0x40];
        let err = decode_track_events(&payload).unwrap_err();
        assert!(matches!(err, MidiSlideError::MalformedInput(_)));
    }

    #[test]
    fn test_note_velocity_out_of_range() {
        let payload = [0x00, 0x90, 0x3C, 0x85];
        let err = decode_track_events(&payload).unwrap_err();
        assert!(matches!(err, MidiSlideError::MalformedInput(_)));
    }

    #[test]
    fn test_end_of_track_stops_decoding() {
        let payload = [
            0x00, 0xFF, 0x2F, 0x00, // end of track
            0x00, 0x90, 60, 64, // unreachable note
        ];
        let events = decode_track_events(&payload).unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            TrackEvent::Meta {
                meta_type: META_END_OF_TRACK,
                ..
            }
        ));
    }

    #[test]
    fn test_sysex_and_untyped_channel_messages() {
        let payload = [
            0x00, 0xF0, 0x02, 0x01, 0x02, // sysex, 2 data bytes
            0x08, 0xB0, 0x07, 0x64, // control change
            0x08, 0xC1, 0x05, // program change
            0x00, 0xFF, 0x2F, 0x00, // end of track
        ];
        let events = decode_track_events(&payload).unwrap();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], TrackEvent::SysEx { status: 0xF0, .. }));
        assert!(matches!(
            &events[1],
            TrackEvent::Channel {
                tick: 8,
                message: ChannelMessage::Other { status: 0xB0, .. }
            }
        ));
        assert!(matches!(
            &events[2],
            TrackEvent::Channel {
                tick: 16,
                message: ChannelMessage::Other { status: 0xC1, .. }
            }
        ));
    }

    #[test]
    fn test_scan_track_length_finds_end_of_track() {
        let payload = [
            0x00, 0x90, 60, 64, //
            0x64, 0x80, 60, 64, //
            0x00, 0xFF, 0x2F, 0x00, //
            0xAA, 0xBB, // trailing garbage, not scanned
        ];
        assert_eq!(scan_track_length(&payload), Some(12));
    }

    #[test]
    fn test_scan_track_length_without_end_of_track() {
        let payload = [0x00, 0x90, 60, 64];
        assert_eq!(scan_track_length(&payload), None);
    }
}
