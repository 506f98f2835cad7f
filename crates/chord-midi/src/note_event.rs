use audio_understand::ChordSegment;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Resolution of exported files.
pub const TICKS_PER_BEAT: u16 = 480;

/// MIDI note of pitch class C in the export octave: note 60 (middle C).
pub const BASE_NOTE: u8 = 60;

/// Tempo used when the analysis tempo is unusable.
pub const DEFAULT_BPM: f64 = 120.0;

const PITCH_CLASSES: [(&str, u8); 12] = [
    ("C", 0),
    ("C#", 1),
    ("D", 2),
    ("D#", 3),
    ("E", 4),
    ("F", 5),
    ("F#", 6),
    ("G", 7),
    ("G#", 8),
    ("A", 9),
    ("A#", 10),
    ("B", 11),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    On,
    Off,
}

/// One delta-timed note event on the export track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub kind: NoteKind,
    pub pitch: u8,
    /// Ticks since the previous event on the track
    pub delta_ticks: u64,
}

impl NoteEvent {
    pub fn on(pitch: u8, delta_ticks: u64) -> Self {
        Self {
            kind: NoteKind::On,
            pitch,
            delta_ticks,
        }
    }

    pub fn off(pitch: u8, delta_ticks: u64) -> Self {
        Self {
            kind: NoteKind::Off,
            pitch,
            delta_ticks,
        }
    }
}

/// Event stream plus the timing constants it was computed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordExport {
    pub microseconds_per_beat: u32,
    pub ticks_per_beat: u16,
    pub events: Vec<NoteEvent>,
}

/// Pitch class of a chord name's root: leading letter plus an optional `#`.
///
/// Only the root is read; "C#min7" and "C#" both give 1. Flats are not
/// recognized, so "Bbmaj" reads as B.
pub fn root_pitch_class(chord_name: &str) -> Option<u8> {
    let mut chars = chord_name.trim_start().chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let sharp = chars.next() == Some('#');

    let mut root = String::with_capacity(2);
    root.push(letter);
    if sharp {
        root.push('#');
    }

    PITCH_CLASSES
        .iter()
        .find(|(name, _)| *name == root)
        .map(|(_, pc)| *pc)
}

/// Tempo in BPM, or `fallback` if it is zero, negative or not a number.
pub fn effective_bpm(tempo: f64, fallback: f64) -> f64 {
    if tempo.is_finite() && tempo > 0.0 {
        tempo
    } else if fallback.is_finite() && fallback > 0.0 {
        fallback
    } else {
        DEFAULT_BPM
    }
}

/// Largest value a tempo meta event can hold (24 bits).
pub const MAX_MICROSECONDS_PER_BEAT: u32 = 0x00FF_FFFF;

/// Microseconds per beat for a tempo, as stored in the tempo meta event.
///
/// Clamped to `1..=MAX_MICROSECONDS_PER_BEAT` so tick timing is computed
/// with exactly the value the file will carry.
pub fn bpm_to_tempo(bpm: f64) -> u32 {
    let usec = (60_000_000.0 / bpm).round();
    if usec.is_nan() {
        return MAX_MICROSECONDS_PER_BEAT;
    }
    usec.clamp(1.0, MAX_MICROSECONDS_PER_BEAT as f64) as u32
}

/// Absolute seconds to ticks at [`TICKS_PER_BEAT`].
pub fn seconds_to_ticks(seconds: f64, microseconds_per_beat: u32) -> u64 {
    if !(seconds > 0.0) || microseconds_per_beat == 0 {
        return 0;
    }
    let ticks = seconds * 1_000_000.0 * TICKS_PER_BEAT as f64 / microseconds_per_beat as f64;
    ticks.round() as u64
}

/// Map chord segments to root-note on/off pairs.
///
/// Each segment becomes a note-on at its start and a note-off at its end,
/// pitched at `BASE_NOTE + root`. Chord quality is dropped. Segments with no
/// recognizable root are skipped; the following note-on's delta spans the gap.
pub fn chords_to_events(
    chords: &[ChordSegment],
    tempo: f64,
    fallback_bpm: f64,
) -> Result<ChordExport> {
    if chords.is_empty() {
        return Err(Error::NothingToExport);
    }

    let bpm = effective_bpm(tempo, fallback_bpm);
    if bpm != tempo {
        warn!(tempo, bpm, "analysis tempo unusable, exporting at fallback tempo");
    }
    let microseconds_per_beat = bpm_to_tempo(bpm);

    let mut events = Vec::with_capacity(chords.len() * 2);
    let mut last_tick = 0u64;

    for chord in chords {
        let Some(root) = root_pitch_class(&chord.chord_name) else {
            warn!(
                chord = %chord.chord_name,
                start = chord.start_time,
                "no root in chord name, skipping"
            );
            continue;
        };
        let pitch = BASE_NOTE + root;

        let start = seconds_to_ticks(chord.start_time, microseconds_per_beat);
        let end = seconds_to_ticks(chord.end_time, microseconds_per_beat);

        events.push(NoteEvent::on(pitch, start.saturating_sub(last_tick)));
        events.push(NoteEvent::off(pitch, end.saturating_sub(start)));
        last_tick = end.max(last_tick);
    }

    if events.is_empty() {
        return Err(Error::NothingToExport);
    }

    Ok(ChordExport {
        microseconds_per_beat,
        ticks_per_beat: TICKS_PER_BEAT,
        events,
    })
}
