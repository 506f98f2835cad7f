use std::sync::OnceLock;

use crate::types::ChordQuality;

const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub fn note_name(pitch_class: u8) -> &'static str {
    NOTE_NAMES_SHARP[(pitch_class % 12) as usize]
}

/// Pitch-class bitmask for a set of intervals: bit i set means interval i is present.
const fn interval_mask(intervals: &[u8]) -> u16 {
    let mut mask = 0u16;
    let mut i = 0;
    while i < intervals.len() {
        mask |= 1 << intervals[i];
        i += 1;
    }
    mask
}

/// Circular right-shift of a 12-bit pitch-class mask.
fn rotate_mask(mask: u16, root: u8) -> u16 {
    let root = (root % 12) as u16;
    ((mask << root) | (mask >> ((12 - root) % 12))) & 0x0FFF
}

/// A binary chroma template for one root + quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordTemplate {
    pub root: u8,
    pub quality: ChordQuality,
    /// bit i set means pitch class i belongs to the chord
    pub pitch_classes: u16,
}

impl ChordTemplate {
    pub fn new(root: u8, quality: ChordQuality) -> Self {
        let root = root % 12;
        Self {
            root,
            quality,
            pitch_classes: rotate_mask(interval_mask(quality.intervals()), root),
        }
    }

    /// Chord name without separator: "Cmaj", "F#min", "G7".
    pub fn name(&self) -> String {
        format!("{}{}", note_name(self.root), self.quality.suffix())
    }

    pub fn contains(&self, pitch_class: u8) -> bool {
        self.pitch_classes & (1 << (pitch_class % 12)) != 0
    }

    /// Template as a 0/1 chroma vector.
    pub fn vector(&self) -> [f64; 12] {
        let mut v = [0.0; 12];
        for (pc, slot) in v.iter_mut().enumerate() {
            if self.contains(pc as u8) {
                *slot = 1.0;
            }
        }
        v
    }

    pub fn size(&self) -> usize {
        self.pitch_classes.count_ones() as usize
    }
}

/// All 84 chord templates, ordered root-major (C..B), then quality in
/// `ChordQuality::ALL` order. Recognition ties resolve to the earlier entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordTemplateSet {
    templates: Vec<ChordTemplate>,
}

impl ChordTemplateSet {
    pub fn build() -> Self {
        let templates = (0..12u8)
            .flat_map(|root| {
                ChordQuality::ALL
                    .iter()
                    .map(move |&quality| ChordTemplate::new(root, quality))
            })
            .collect();
        Self { templates }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChordTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, root: u8, quality: ChordQuality) -> Option<&ChordTemplate> {
        self.templates
            .iter()
            .find(|t| t.root == root % 12 && t.quality == quality)
    }
}

impl<'a> IntoIterator for &'a ChordTemplateSet {
    type Item = &'a ChordTemplate;
    type IntoIter = std::slice::Iter<'a, ChordTemplate>;

    fn into_iter(self) -> Self::IntoIter {
        self.templates.iter()
    }
}

/// Process-wide template table, built on first use and never mutated.
pub fn templates() -> &'static ChordTemplateSet {
    static TEMPLATES: OnceLock<ChordTemplateSet> = OnceLock::new();
    TEMPLATES.get_or_init(ChordTemplateSet::build)
}
