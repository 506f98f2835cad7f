use audio_understand::AnalysisResult;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::note_event::{
    chords_to_events, ChordExport, NoteKind, DEFAULT_BPM, MAX_MICROSECONDS_PER_BEAT,
};
use crate::{Error, Result};

/// Options for MIDI export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Note-on and note-off velocity. Default: 64.
    pub velocity: u8,
    /// MIDI channel 0-15. Default: 0.
    pub channel: u8,
    /// Tempo written when the analysis tempo is not positive. Default: 120.
    pub default_bpm: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            velocity: 64,
            channel: 0,
            default_bpm: DEFAULT_BPM,
        }
    }
}

/// Write an analyzed chord progression as a format 0 Standard MIDI File.
///
/// One track: tempo meta event, the root-note events from
/// [`chords_to_events`], end of track.
pub fn result_to_midi(result: &AnalysisResult, options: &ExportOptions) -> Result<Vec<u8>> {
    let export = chords_to_events(&result.chords, result.tempo, options.default_bpm)?;
    let bytes = encode_smf(&export, options)?;

    info!(
        chords = result.chords.len(),
        events = export.events.len(),
        bytes = bytes.len(),
        "chord MIDI exported"
    );
    Ok(bytes)
}

/// Frame an event stream as SMF bytes.
pub fn encode_smf(export: &ChordExport, options: &ExportOptions) -> Result<Vec<u8>> {
    let header = Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(export.ticks_per_beat.min(0x7FFF))),
    );
    let channel = u4::new(options.channel.min(15));
    let vel = u7::new(options.velocity.min(127));

    let mut track = Vec::with_capacity(export.events.len() + 2);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(
            export.microseconds_per_beat.min(MAX_MICROSECONDS_PER_BEAT),
        ))),
    });

    for event in &export.events {
        let key = u7::new(event.pitch.min(127));
        let message = match event.kind {
            NoteKind::On => MidiMessage::NoteOn { key, vel },
            NoteKind::Off => MidiMessage::NoteOff { key, vel },
        };
        let delta = u32::try_from(event.delta_ticks)
            .ok()
            .filter(|d| *d <= 0x0FFF_FFFF)
            .ok_or_else(|| {
                Error::Encode(format!("delta of {} ticks exceeds MIDI range", event.delta_ticks))
            })?;

        track.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi { channel, message },
        });
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let mut smf = Smf::new(header);
    smf.tracks.push(track);

    let mut buf = Vec::new();
    smf.write_std(&mut buf)
        .map_err(|e| Error::Encode(e.to_string()))?;
    Ok(buf)
}

/// Download name for an exported track: `<stem>_chords.mid`.
///
/// Stored uploads are prefixed with an identifier up to the first `_`, which
/// is dropped along with the extension.
pub fn export_filename(original: &str) -> String {
    let name = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let without_prefix = name.split_once('_').map_or(name, |(_, rest)| rest);
    let stem = without_prefix
        .rsplit_once('.')
        .map_or(without_prefix, |(stem, _)| stem);
    let stem = if stem.is_empty() { "track" } else { stem };
    format!("{}_chords.mid", stem)
}
