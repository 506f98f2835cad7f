//! Manual chord corrections.

use tracing::info;

use crate::error::{Error, Result};
use crate::types::{AnalysisResult, ChordSegment};

/// Confidence assigned to a user-entered chord.
pub const GROUND_TRUTH_CONFIDENCE: f64 = 1.0;

/// Rename `result.chords[index]` and mark it as ground truth.
///
/// The label is trimmed. An out-of-range index or blank label is rejected and
/// leaves `result` untouched. Neighbouring segments are never re-merged, even
/// if they now share the new name.
pub fn apply_correction<'a>(
    result: &'a mut AnalysisResult,
    index: usize,
    new_name: &str,
) -> Result<&'a ChordSegment> {
    let name = new_name.trim();
    if name.is_empty() {
        return Err(Error::CorrectionRejected("chord name is empty".to_string()));
    }

    let count = result.chords.len();
    let segment = result.chords.get_mut(index).ok_or_else(|| {
        Error::CorrectionRejected(format!("index {} out of range ({} chords)", index, count))
    })?;

    info!(index, from = %segment.chord_name, to = name, "chord corrected");
    segment.chord_name = name.to_string();
    segment.confidence = GROUND_TRUTH_CONFIDENCE;

    Ok(segment)
}

impl AnalysisResult {
    /// See [`apply_correction`].
    pub fn correct_chord(&mut self, index: usize, new_name: &str) -> Result<&ChordSegment> {
        apply_correction(self, index, new_name)
    }
}
