use serde::{Deserialize, Serialize};

use crate::chord_templates::note_name;
use crate::correlate::{first_max, pearson};
use crate::types::{ChromaFrame, KeyMode};

/// Label reported when no key can be estimated.
pub const UNKNOWN_KEY: &str = "N/A";

/// Krumhansl-Kessler major key profile (duration-weighted perception studies).
pub const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile.
pub const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Expected pitch-class salience for a key rooted on C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneProfile {
    pub mode: KeyMode,
    pub weights: [f64; 12],
}

impl ToneProfile {
    pub const MAJOR: ToneProfile = ToneProfile {
        mode: KeyMode::Major,
        weights: MAJOR_PROFILE,
    };

    pub const MINOR: ToneProfile = ToneProfile {
        mode: KeyMode::Minor,
        weights: MINOR_PROFILE,
    };

    pub fn for_mode(mode: KeyMode) -> Self {
        match mode {
            KeyMode::Major => Self::MAJOR,
            KeyMode::Minor => Self::MINOR,
        }
    }

    /// Profile for a key rooted on `root` (circular right-shift by root).
    pub fn rotated(&self, root: u8) -> [f64; 12] {
        let root = (root % 12) as usize;
        let mut out = [0.0; 12];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.weights[(i + 12 - root) % 12];
        }
        out
    }
}

/// Best-matching key for a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEstimate {
    /// Pitch class 0–11 (C=0, C#=1, ...)
    pub root_pitch_class: u8,
    pub mode: KeyMode,
    /// Pearson correlation with the winning rotated profile
    pub correlation: f64,
}

impl KeyEstimate {
    /// Title-cased label: "C major", "F# minor".
    pub fn label(&self) -> String {
        format!("{} {}", note_name(self.root_pitch_class), self.mode)
    }
}

/// Per-pitch-class sum over every frame of a chroma matrix.
pub fn aggregate_chroma(chroma: &[ChromaFrame]) -> ChromaFrame {
    let mut total = [0.0; 12];
    for frame in chroma {
        for (acc, v) in total.iter_mut().zip(frame.iter()) {
            *acc += v;
        }
    }
    total
}

/// Krumhansl-Schmuckler key estimation over an aggregate chroma vector.
///
/// Candidates are visited root 0..11, major before minor within a root; the
/// first maximum wins. Returns `None` when no candidate has a defined
/// correlation (e.g. a flat or silent aggregate).
pub fn estimate_key(aggregate: &ChromaFrame) -> Option<KeyEstimate> {
    let candidates = (0..12u8).flat_map(|root| {
        KeyMode::ALL.iter().map(move |&mode| {
            let profile = ToneProfile::for_mode(mode).rotated(root);
            (pearson(aggregate, &profile), (root, mode))
        })
    });

    match first_max(candidates)? {
        (Some(correlation), (root, mode)) => Some(KeyEstimate {
            root_pitch_class: root,
            mode,
            correlation,
        }),
        (None, _) => None,
    }
}

/// Key label for a coarse chroma matrix, or `"N/A"` if it is degenerate.
pub fn detect_key(chroma: &[ChromaFrame]) -> String {
    if chroma.is_empty() {
        return UNKNOWN_KEY.to_string();
    }

    estimate_key(&aggregate_chroma(chroma))
        .map(|estimate| estimate.label())
        .unwrap_or_else(|| UNKNOWN_KEY.to_string())
}
