pub mod midi_writer;
pub mod note_event;

pub use midi_writer::{export_filename, result_to_midi, ExportOptions};
pub use note_event::{
    chords_to_events, root_pitch_class, seconds_to_ticks, ChordExport, NoteEvent, NoteKind,
    BASE_NOTE, DEFAULT_BPM, MAX_MICROSECONDS_PER_BEAT, TICKS_PER_BEAT,
};

/// Errors from MIDI export.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no chords to export")]
    NothingToExport,

    #[error("MIDI encode error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
