//! Mapping of timed notes onto a slide schedule.
//!
//! This is the timing half of the video assembly contract: each note holds
//! one image on screen for its duration, images are assigned round-robin.
//! Encoding and image handling live with the consumer.

use crate::timing::note_extractor::MidiNote;
use serde::Serialize;

/// One slide: which image to show, when, and for how long.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideCue {
    pub image_index: usize,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

/// Assign images round-robin to notes and convert tick timing to seconds.
///
/// The terminal marker note becomes a zero-duration final cue marking file
/// end. With no images to cycle through the schedule is empty.
pub fn build_slide_schedule(
    notes: &[MidiNote],
    seconds_per_tick: f64,
    image_count: usize,
) -> Vec<SlideCue> {
    if image_count == 0 {
        return Vec::new();
    }
    notes
        .iter()
        .enumerate()
        .map(|(index, note)| SlideCue {
            image_index: index % image_count,
            start_seconds: note.ticks_from_start as f64 * seconds_per_tick,
            duration_seconds: note.duration_in_ticks as f64 * seconds_per_tick,
        })
        .collect()
}

/// Total wall-clock length of the note list in seconds.
pub fn total_seconds(notes: &[MidiNote], seconds_per_tick: f64) -> f64 {
    notes
        .last()
        .map_or(0.0, |note| note.end_tick() as f64 * seconds_per_tick)
}
