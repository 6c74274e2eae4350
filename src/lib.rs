//! Midislide - MIDI note timing extraction for music-synced slideshows
//!
//! This library provides:
//! - Parsing of standard MIDI files (format 0 and 1)
//! - Timebase resolution from tempo metadata (seconds per tick)
//! - Note pairing and slide schedule generation
//!
//! # Example
//!
//! ```no_run
//! use midislide::{build_slide_schedule, extract_notes, parse_midi_data, resolve_timebase};
//!
//! let file_data = std::fs::read("song.mid").unwrap();
//! let file = parse_midi_data(&file_data).unwrap();
//! let seconds_per_tick = resolve_timebase(&file).unwrap();
//! let notes = extract_notes(&file).unwrap();
//! let schedule = build_slide_schedule(&notes, seconds_per_tick, 12);
//! ```

pub mod error;
pub mod parser;
pub mod timing;

// Re-export main types for convenience
pub use error::MidiSlideError;
pub use parser::event_parser::{ChannelMessage, META_END_OF_TRACK, META_SET_TEMPO, TrackEvent};
pub use parser::midi_parser::{
    Division, HeaderChunk, MidiFormat, StandardMidiFile, TrackChunk, parse_midi_data,
};
pub use timing::note_extractor::{MidiNote, extract_notes};
pub use timing::slideshow::{SlideCue, build_slide_schedule, total_seconds};
pub use timing::timebase::{DEFAULT_MICROS_PER_QUARTER_NOTE, resolve_timebase};
