//! Error types for the midislide library

use std::io;

/// Library error type for midislide operations
#[derive(Debug, thiserror::Error)]
pub enum MidiSlideError {
    /// Structurally invalid bytes at the primitive or event level
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Wrong magic bytes, wrong header size or unresolvable track length
    #[error("invalid MIDI file: {0}")]
    InvalidMidiFile(String),

    /// MIDI format other than 0 or 1
    #[error("unsupported MIDI format: {0}")]
    UnsupportedFormat(u16),

    /// SMPTE time division
    #[error("unsupported SMPTE time division")]
    UnsupportedDivision,

    /// More than one set-tempo meta event
    #[error("found {0} tempo events, only a single constant tempo is supported")]
    MultipleTempoEvents(usize),

    /// Odd number of note-on/note-off events
    #[error("odd note event count: {0}")]
    OddNoteEventCount(usize),

    /// Closing note event on a different key than the opening note-on
    #[error("mismatched note key: note-on {opening} closed by key {closing}")]
    MismatchedNoteKey { opening: u8, closing: u8 },

    /// Note-on while another note is still sounding
    #[error("overlapping note: key {incoming} starts while key {open} is still sounding")]
    OverlappingNote { open: u8, incoming: u8 },

    /// Data left over after the last track chunk
    #[error("{0} trailing bytes after the last track chunk")]
    ExcessTrailingBytes(usize),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<io::Error> for MidiSlideError {
    fn from(error: io::Error) -> Self {
        Self::IoError(error.to_string())
    }
}
