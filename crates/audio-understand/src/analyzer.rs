use crate::chord_templates::{templates, ChordTemplateSet};
use crate::chords::recognize_chords;
use crate::key::detect_key;
use crate::provider::FrameClock;
use crate::types::{ChordSegment, ChromaFrame};

/// Trait for music analysis backends.
///
/// `TemplateAnalyzer` does Krumhansl-Schmuckler key estimation and
/// chroma-template chord matching. Alternative backends (learned models,
/// different vocabularies) plug in here.
pub trait AudioAnalyzer: Send + Sync {
    /// Key label for a coarse chroma matrix.
    fn analyze_key(&self, chroma: &[ChromaFrame]) -> String;

    /// Merged chord segments for a fine chroma matrix and beat grid.
    fn extract_chords(
        &self,
        chroma: &[ChromaFrame],
        beat_times: &[f64],
        clock: &dyn FrameClock,
    ) -> Vec<ChordSegment>;
}

/// Template-matching analyzer over an injected chord template table.
#[derive(Debug, Clone, Copy)]
pub struct TemplateAnalyzer {
    templates: &'static ChordTemplateSet,
}

impl TemplateAnalyzer {
    pub fn new(templates: &'static ChordTemplateSet) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &ChordTemplateSet {
        self.templates
    }
}

impl Default for TemplateAnalyzer {
    fn default() -> Self {
        Self::new(templates())
    }
}

impl AudioAnalyzer for TemplateAnalyzer {
    fn analyze_key(&self, chroma: &[ChromaFrame]) -> String {
        detect_key(chroma)
    }

    fn extract_chords(
        &self,
        chroma: &[ChromaFrame],
        beat_times: &[f64],
        clock: &dyn FrameClock,
    ) -> Vec<ChordSegment> {
        recognize_chords(chroma, beat_times, clock, self.templates)
    }
}
