use serde::{Deserialize, Serialize, Serializer};

/// Pitch-class energies for one analysis frame (C=0 .. B=11).
pub type ChromaFrame = [f64; 12];

/// Ordered chroma frames covering a whole track.
pub type ChromaMatrix = Vec<ChromaFrame>;

/// Normalized RMS energy per equal-width time bucket, values in [0, 1].
pub type WaveformEnvelope = Vec<f64>;

/// Mono audio at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    Major,
    Minor,
}

impl KeyMode {
    /// Iteration order used by key estimation; major is checked first.
    pub const ALL: [KeyMode; 2] = [KeyMode::Major, KeyMode::Minor];
}

impl std::fmt::Display for KeyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyMode::Major => write!(f, "major"),
            KeyMode::Minor => write!(f, "minor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Suspended2,
    Suspended4,
    Dominant7,
}

impl ChordQuality {
    /// Template iteration order within a root.
    pub const ALL: [ChordQuality; 7] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
        ChordQuality::Suspended2,
        ChordQuality::Suspended4,
        ChordQuality::Dominant7,
    ];

    /// Suffix appended to the root in chord names ("Cmaj", "A#min", "G7").
    pub fn suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "maj",
            ChordQuality::Minor => "min",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Suspended2 => "sus2",
            ChordQuality::Suspended4 => "sus4",
            ChordQuality::Dominant7 => "7",
        }
    }

    /// Root-position intervals in semitones.
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Suspended2 => &[0, 2, 7],
            ChordQuality::Suspended4 => &[0, 5, 7],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
        }
    }
}

/// A labeled, time-bounded chord span.
///
/// `confidence` is the Pearson correlation between the interval's mean chroma
/// and the winning template. It is kept at full precision and only rounded to
/// two decimals on serialization. User corrections set it to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub chord_name: String,
    #[serde(serialize_with = "serialize_rounded")]
    pub confidence: f64,
}

impl ChordSegment {
    pub fn new(
        start_time: f64,
        end_time: f64,
        chord_name: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            start_time,
            end_time,
            chord_name: chord_name.into(),
            confidence,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Confidence as presented to users.
    pub fn rounded_confidence(&self) -> f64 {
        round2(self.confidence)
    }
}

/// Tempo, key and chord progression for one analyzed track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Beats per minute
    pub tempo: f64,
    /// Title-cased key label ("C major", "F# minor") or "N/A"
    pub key: String,
    pub chords: Vec<ChordSegment>,
}

/// Everything a caller needs to display one analyzed track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub waveform: WaveformEnvelope,
    /// Track length in seconds
    pub duration: f64,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_suffixes_match_names() {
        let suffixes: Vec<_> = ChordQuality::ALL.iter().map(|q| q.suffix()).collect();
        assert_eq!(suffixes, vec!["maj", "min", "dim", "aug", "sus2", "sus4", "7"]);
    }

    #[test]
    fn every_quality_has_three_or_four_tones() {
        for quality in ChordQuality::ALL {
            let n = quality.intervals().len();
            assert!((3..=4).contains(&n), "{:?} has {} tones", quality, n);
            assert_eq!(quality.intervals()[0], 0);
        }
    }

    #[test]
    fn confidence_is_rounded_only_when_serialized() {
        let segment = ChordSegment::new(0.0, 1.5, "Cmaj", 0.87654);
        assert_eq!(segment.confidence, 0.87654);
        assert_eq!(segment.rounded_confidence(), 0.88);

        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["confidence"], 0.88);
        assert_eq!(json["chord_name"], "Cmaj");
        assert_eq!(json["end_time"], 1.5);
    }

    #[test]
    fn result_field_names() {
        let result = AnalysisResult {
            tempo: 120.0,
            key: "C major".into(),
            chords: vec![ChordSegment::new(0.0, 1.0, "Cmaj", 1.0)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("tempo").is_some());
        assert!(json.get("key").is_some());
        assert!(json["chords"][0].get("start_time").is_some());
    }

    #[test]
    fn sample_buffer_duration() {
        let buffer = SampleBuffer::new(vec![0.0; 44100], 22050);
        assert_eq!(buffer.duration(), 2.0);
        assert_eq!(SampleBuffer::new(vec![0.0; 10], 0).duration(), 0.0);
    }
}
