use std::sync::Arc;

use audio_understand::{
    AnalysisEngine, AudioAnalyzer, ChordQuality, ChordSegment, ChordTemplate, ChromaFrame,
    ChromaMatrix, ChromaProfile, Error, FeatureFile, FeatureProvider, FrameClock, HopClock,
    Result, SampleBuffer, ToneProfile,
};
use pretty_assertions::assert_eq;

const RATE: u32 = 22050;

fn chord(root: u8, quality: ChordQuality) -> ChromaFrame {
    ChordTemplate::new(root, quality).vector()
}

/// Two seconds of a quiet ramp; content only matters to the waveform.
fn audio() -> SampleBuffer {
    let samples = (0..RATE as usize * 2)
        .map(|i| ((i as f32) * 0.01).sin() * 0.3)
        .collect();
    SampleBuffer::new(samples, RATE)
}

/// I-V-vi-IV in C, one chord per ~0.5 s (21 frames at hop 512).
fn features() -> FeatureFile {
    let clock = HopClock::default();
    let mut fine = ChromaMatrix::new();
    for frame in [
        chord(0, ChordQuality::Major),
        chord(7, ChordQuality::Major),
        chord(9, ChordQuality::Minor),
        chord(5, ChordQuality::Major),
    ] {
        fine.extend(std::iter::repeat(frame).take(21));
    }

    let beats: Vec<f64> = (0..=8).map(|i| clock.frame_to_time(i * 21 / 2 + (i % 2))).collect();
    let coarse = vec![ToneProfile::MAJOR.rotated(0); 10];

    FeatureFile::new(clock, 118.0, beats, coarse, fine).unwrap()
}

#[test]
fn full_pipeline() {
    let report = AnalysisEngine::new().analyze(&audio(), &features()).unwrap();

    assert_eq!(report.result.tempo, 118.0);
    assert_eq!(report.result.key, "C major");

    let names: Vec<_> = report
        .result
        .chords
        .iter()
        .map(|c| c.chord_name.as_str())
        .collect();
    assert_eq!(names, vec!["Cmaj", "Gmaj", "Amin", "Fmaj"]);

    for pair in report.result.chords.windows(2) {
        assert_ne!(pair[0].chord_name, pair[1].chord_name);
        assert_eq!(pair[0].end_time, pair[1].start_time);
    }

    assert_eq!(report.waveform.len(), 500);
    assert_eq!(report.waveform.iter().copied().fold(0.0, f64::max), 1.0);
    assert_eq!(report.duration, 2.0);
}

#[test]
fn waveform_points_are_configurable() {
    let report = AnalysisEngine::new()
        .waveform_points(64)
        .analyze(&audio(), &features())
        .unwrap();
    assert_eq!(report.waveform.len(), 64);
}

#[test]
fn no_beats_gives_empty_chords() {
    let features = FeatureFile::new(
        HopClock::default(),
        90.0,
        vec![0.5],
        vec![],
        vec![chord(0, ChordQuality::Major); 40],
    )
    .unwrap();

    let report = AnalysisEngine::new().analyze(&audio(), &features).unwrap();
    assert!(report.result.chords.is_empty());
    assert_eq!(report.result.key, "N/A");
}

#[test]
fn serialized_result_shape() {
    let report = AnalysisEngine::new().analyze(&audio(), &features()).unwrap();
    let json = serde_json::to_value(&report.result).unwrap();

    let chords = json["chords"].as_array().unwrap();
    assert_eq!(chords.len(), 4);
    assert_eq!(chords[0]["chord_name"], "Cmaj");
    assert_eq!(chords[0]["confidence"], 1.0);
    assert_eq!(json["key"], "C major");
}

struct BrokenProvider;

impl FeatureProvider for BrokenProvider {
    fn extract_chroma(&self, _: &[f32], _: u32, _: ChromaProfile) -> Result<ChromaMatrix> {
        Err(Error::AnalysisFailed("chroma backend crashed".into()))
    }

    fn estimate_tempo_and_beats(&self, _: &[f32], _: u32) -> Result<(f64, Vec<f64>)> {
        Ok((120.0, vec![0.0, 0.5]))
    }

    fn clock(&self) -> &dyn FrameClock {
        &DEFAULT_CLOCK
    }
}

static DEFAULT_CLOCK: HopClock = HopClock {
    sample_rate: RATE,
    hop_length: 512,
};

#[test]
fn provider_failure_propagates() {
    let err = AnalysisEngine::new()
        .analyze(&audio(), &BrokenProvider)
        .unwrap_err();
    assert!(err.to_string().contains("chroma backend crashed"));
}

struct FixedAnalyzer;

impl AudioAnalyzer for FixedAnalyzer {
    fn analyze_key(&self, _: &[ChromaFrame]) -> String {
        "D minor".into()
    }

    fn extract_chords(
        &self,
        _: &[ChromaFrame],
        _: &[f64],
        _: &dyn FrameClock,
    ) -> Vec<ChordSegment> {
        vec![ChordSegment::new(0.0, 1.0, "Dmin", 0.5)]
    }
}

#[test]
fn custom_analyzer_is_used() {
    let engine = AnalysisEngine::with_analyzer(Arc::new(FixedAnalyzer));
    let report = engine.analyze(&audio(), &features()).unwrap();
    assert_eq!(report.result.key, "D minor");
    assert_eq!(report.result.chords, vec![ChordSegment::new(0.0, 1.0, "Dmin", 0.5)]);
}
