//! Standard MIDI file chunk parsing.
//!
//! Chunk layout per the SMF 1.0 specification: one "MThd" header chunk
//! followed by "MTrk" track chunks, all integers big-endian.

use crate::error::MidiSlideError;
use crate::parser::event_parser::{TrackEvent, decode_track_events, scan_track_length};
use crate::parser::primitive_parser::{parse_u16_be, parse_u32_be, take_bytes};

/// Header chunk magic.
const HEADER_MAGIC: &[u8] = b"MThd";
/// Track chunk magic.
const TRACK_MAGIC: &[u8] = b"MTrk";
/// Fixed byte length of the header chunk body.
const HEADER_BODY_LEN: u32 = 6;
/// Byte length of a track chunk sub-header (magic + declared length).
const TRACK_HEADER_LEN: usize = 8;
/// Division flag bit separating SMPTE from ticks-per-quarter-note.
const SMPTE_FLAG: u16 = 0x8000;
/// SMPTE frame rates admitted by the header division field.
const SMPTE_FORMATS: [i8; 4] = [-24, -25, -29, -30];
/// Cap on a track's declared length, rejecting files whose chunk headers
/// imply nonsense allocations.
const MAX_TRACK_BYTES: u32 = 16 * 1024 * 1024;

/// MIDI file format. Format 2 (sequential independent patterns) is
/// recognized in the header but rejected at parse time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MidiFormat {
    /// Format 0, one multi-channel track
    SingleTrack,
    /// Format 1, simultaneous tracks
    MultiTrack,
}

/// Header time division.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Division {
    /// Ticks per quarter note
    TicksPerQuarterNote(u16),
    /// SMPTE frames per second (negated) and ticks per frame
    Smpte { format: i8, ticks_per_frame: u8 },
}

/// Parsed "MThd" chunk body.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HeaderChunk {
    pub format: MidiFormat,
    pub track_count: u16,
    pub division: Division,
}

/// Parsed "MTrk" chunk, reduced to its decoded event list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackChunk {
    pub events: Vec<TrackEvent>,
}

/// An immutable parsed MIDI file. Track order is file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardMidiFile {
    pub header: HeaderChunk,
    pub tracks: Vec<TrackChunk>,
}

impl StandardMidiFile {
    /// Iterate all events, tracks concatenated in file order.
    ///
    /// For format 1 this is a concatenation, not a time merge: each track
    /// restarts its own tick offsets.
    pub fn events(&self) -> impl Iterator<Item = &TrackEvent> {
        self.tracks.iter().flat_map(|track| track.events.iter())
    }
}

fn invalid(message: impl Into<String>) -> MidiSlideError {
    MidiSlideError::InvalidMidiFile(message.into())
}

/// Parse a complete standard MIDI file held in memory.
pub fn parse_midi_data(file_data: &[u8]) -> Result<StandardMidiFile, MidiSlideError> {
    let (rest, header) = parse_header_chunk(file_data)?;
    log::debug!(
        "parsed header: format {:?}, {} tracks, division {:?}",
        header.format,
        header.track_count,
        header.division
    );

    let mut tracks = Vec::with_capacity(usize::from(header.track_count));
    let mut rest = rest;
    while rest.len() >= TRACK_HEADER_LEN {
        let (next, track) = parse_track_chunk(rest)?;
        tracks.push(track);
        rest = next;
    }
    if !rest.is_empty() {
        return Err(MidiSlideError::ExcessTrailingBytes(rest.len()));
    }
    Ok(StandardMidiFile { header, tracks })
}

fn parse_header_chunk(i: &[u8]) -> Result<(&[u8], HeaderChunk), MidiSlideError> {
    let (i, magic) =
        take_bytes(i, 4).map_err(|_| invalid("file shorter than a header chunk"))?;
    if magic != HEADER_MAGIC {
        return Err(invalid(format!("bad header magic {magic:02X?}")));
    }
    let (i, body_len) =
        parse_u32_be(i).map_err(|_| invalid("file shorter than a header chunk"))?;
    if body_len != HEADER_BODY_LEN {
        return Err(invalid(format!("header body length {body_len}, expected 6")));
    }
    let (i, format_raw) = parse_u16_be(i).map_err(|_| invalid("truncated header body"))?;
    let format = match format_raw {
        0 => MidiFormat::SingleTrack,
        1 => MidiFormat::MultiTrack,
        other => return Err(MidiSlideError::UnsupportedFormat(other)),
    };
    let (i, track_count) = parse_u16_be(i).map_err(|_| invalid("truncated header body"))?;
    let (i, division_raw) = parse_u16_be(i).map_err(|_| invalid("truncated header body"))?;
    let division = parse_division(division_raw)?;
    Ok((
        i,
        HeaderChunk {
            format,
            track_count,
            division,
        },
    ))
}

fn parse_division(raw: u16) -> Result<Division, MidiSlideError> {
    if raw & SMPTE_FLAG == 0 {
        return Ok(Division::TicksPerQuarterNote(raw));
    }
    let format = (raw >> 8) as u8 as i8;
    let ticks_per_frame = (raw & 0xFF) as u8;
    if !SMPTE_FORMATS.contains(&format) {
        return Err(MidiSlideError::MalformedInput(format!(
            "SMPTE frame rate {format} not in {SMPTE_FORMATS:?}"
        )));
    }
    Ok(Division::Smpte {
        format,
        ticks_per_frame,
    })
}

fn parse_track_chunk(i: &[u8]) -> Result<(&[u8], TrackChunk), MidiSlideError> {
    let (i, magic) = take_bytes(i, 4).map_err(|_| invalid("truncated track header"))?;
    if magic != TRACK_MAGIC {
        return Err(invalid(format!("bad track magic {magic:02X?}")));
    }
    let (i, declared) = parse_u32_be(i).map_err(|_| invalid("truncated track header"))?;
    if declared == 0 {
        return Err(invalid("track chunk with zero length"));
    }
    if declared > MAX_TRACK_BYTES {
        return Err(invalid(format!(
            "track declares {declared} bytes, above the {MAX_TRACK_BYTES} byte cap"
        )));
    }

    let resolved = resolve_track_length(declared as usize, i);
    if resolved > i.len() {
        return Err(invalid(format!(
            "track length {resolved} runs past the end of the file"
        )));
    }
    let events = decode_track_events(&i[..resolved])?;
    Ok((&i[resolved..], TrackChunk { events }))
}

/// Settle a disagreement between a track's declared length and the length
/// implied by its end-of-track event. Files in the wild lie about length or
/// omit end-of-track; precedence is declared-confirmed-by-scan, then the
/// scanned length, then the declared one as a fallback.
fn resolve_track_length(declared: usize, payload: &[u8]) -> usize {
    match scan_track_length(payload) {
        Some(scanned) if scanned == declared => declared,
        Some(scanned) => {
            log::debug!("track declares {declared} bytes but ends at {scanned}, using the scan");
            scanned
        }
        None => declared,
    }
}
