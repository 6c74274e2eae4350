use clap::Parser;
use midislide::MidiSlideError as LibError;
use midislide::{
    build_slide_schedule, extract_notes, parse_midi_data, resolve_timebase, total_seconds,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

fn main() {
    let result = main_result();
    std::process::exit(match result {
        Ok(()) => 0,
        Err(err) => {
            // use Display instead of Debug for user friendly error messages
            log::error!("{err}");
            1
        }
    });
}

pub fn main_result() -> Result<(), AppError> {
    // setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("midislide=info"))
        .init();

    // args
    let args = CliArgs::parse();
    let midi_file_path = PathBuf::from(&args.midi_file);

    // check if MIDI file exists
    if !midi_file_path.exists() {
        let err = AppError::ConfigError(format!("MIDI file not found {midi_file_path:?}"));
        return Err(err);
    }
    log::info!("Reading MIDI file {midi_file_path:?}");

    let file_data = std::fs::read(&midi_file_path)?;
    let file = parse_midi_data(&file_data)?;
    let seconds_per_tick = resolve_timebase(&file)?;
    let notes = extract_notes(&file)?;
    log::info!(
        "{} notes over {:.3} seconds at {seconds_per_tick} seconds/tick",
        notes.len().saturating_sub(1),
        total_seconds(&notes, seconds_per_tick)
    );

    let schedule = build_slide_schedule(&notes, seconds_per_tick, args.image_count);
    if args.json {
        let json = serde_json::to_string_pretty(&schedule)
            .map_err(|err| AppError::OtherError(format!("Could not serialize schedule {err}")))?;
        println!("{json}");
    } else {
        for cue in &schedule {
            println!(
                "[slide@{}: image {} for {:.3}s]",
                format_time(cue.start_seconds),
                cue.image_index,
                cue.duration_seconds
            );
        }
    }
    Ok(())
}

fn format_time(seconds: f64) -> String {
    let duration = Duration::from_secs_f64(seconds);
    let minutes = duration.as_secs() / 60;
    let seconds = duration.as_secs() % 60;
    let fractional = duration.subsec_millis();
    format!("{minutes:02}:{seconds:02}.{fractional:03}")
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the MIDI file to extract timing from.
    #[arg(long)]
    midi_file: String,
    /// Number of images to cycle through round-robin.
    #[arg(long, default_value_t = 1)]
    image_count: usize,
    /// Print the schedule as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("parsing error: {0}")]
    ParsingError(String),
    #[error("other error: {0}")]
    OtherError(String),
}

impl From<LibError> for AppError {
    fn from(error: LibError) -> Self {
        match error {
            LibError::IoError(s) => Self::OtherError(s),
            other => Self::ParsingError(other.to_string()),
        }
    }
}

impl From<io::Error> for AppError {
    fn from(error: io::Error) -> Self {
        Self::OtherError(error.to_string())
    }
}
