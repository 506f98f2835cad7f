use tracing::debug;

use crate::chord_templates::{ChordTemplate, ChordTemplateSet};
use crate::correlate::{first_max, pearson};
use crate::provider::FrameClock;
use crate::types::{ChordSegment, ChromaFrame};

/// Best template for one beat interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordMatch {
    pub template: ChordTemplate,
    /// `None` when the interval's chroma has zero variance
    pub correlation: Option<f64>,
}

impl ChordMatch {
    /// Correlation as stored on a segment; undefined scores count as 0.0.
    pub fn confidence(&self) -> f64 {
        self.correlation.unwrap_or(0.0)
    }
}

/// Convert beat timestamps to chroma frame indices.
pub fn beat_frames(beat_times: &[f64], clock: &dyn FrameClock) -> Vec<usize> {
    beat_times.iter().map(|&t| clock.time_to_frame(t)).collect()
}

/// Element-wise mean of a run of chroma frames.
pub fn mean_chroma(frames: &[ChromaFrame]) -> ChromaFrame {
    let mut mean = [0.0; 12];
    if frames.is_empty() {
        return mean;
    }
    for frame in frames {
        for (acc, v) in mean.iter_mut().zip(frame.iter()) {
            *acc += v;
        }
    }
    let n = frames.len() as f64;
    for v in &mut mean {
        *v /= n;
    }
    mean
}

/// Correlate a chroma vector against every template and keep the first maximum.
///
/// Templates with an undefined correlation never win unless all of them are
/// undefined, in which case the first template in the set is returned.
pub fn classify_chroma(chroma: &ChromaFrame, templates: &ChordTemplateSet) -> Option<ChordMatch> {
    let candidates = templates
        .iter()
        .map(|template| (pearson(chroma, &template.vector()), *template));

    first_max(candidates).map(|(correlation, template)| ChordMatch {
        template,
        correlation,
    })
}

/// Beat-synchronous chord recognition.
///
/// Each pair of consecutive beat frames `[f_i, f_i+1)` is averaged and matched
/// against the templates. Pairs that collapse onto the same frame, or that
/// start past the end of the chroma matrix, produce nothing. An interval
/// running past the end is averaged over the frames that exist. Consecutive
/// intervals with the same chord are merged.
pub fn recognize_chords(
    chroma: &[ChromaFrame],
    beat_times: &[f64],
    clock: &dyn FrameClock,
    templates: &ChordTemplateSet,
) -> Vec<ChordSegment> {
    if beat_times.len() < 2 || chroma.is_empty() {
        debug!(
            beats = beat_times.len(),
            frames = chroma.len(),
            "not enough beats or frames for chord intervals"
        );
        return Vec::new();
    }

    let frames = beat_frames(beat_times, clock);
    let mut provisional = Vec::with_capacity(frames.len() - 1);

    for pair in frames.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if start >= end || start >= chroma.len() {
            continue;
        }

        let interval = &chroma[start..end.min(chroma.len())];
        let Some(found) = classify_chroma(&mean_chroma(interval), templates) else {
            continue;
        };

        provisional.push(ChordSegment::new(
            clock.frame_to_time(start),
            clock.frame_to_time(end),
            found.template.name(),
            found.confidence(),
        ));
    }

    let merged = merge_segments(provisional);
    debug!(intervals = frames.len() - 1, segments = merged.len(), "chords recognized");
    merged
}

/// Collapse runs of identically named segments into one span.
///
/// The kept segment takes the end time of the last segment in its run and
/// retains its own confidence.
pub fn merge_segments(provisional: impl IntoIterator<Item = ChordSegment>) -> Vec<ChordSegment> {
    let mut merged: Vec<ChordSegment> = Vec::new();

    for segment in provisional {
        match merged.last_mut() {
            Some(last) if last.chord_name == segment.chord_name => {
                last.end_time = segment.end_time;
            }
            _ => merged.push(segment),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord_templates::templates;
    use crate::provider::HopClock;
    use crate::types::ChordQuality;

    /// One frame per second keeps beat/frame arithmetic readable.
    fn second_clock() -> HopClock {
        HopClock::new(100, 100).unwrap()
    }

    fn template_frame(root: u8, quality: ChordQuality, scale: f64) -> ChromaFrame {
        ChordTemplate::new(root, quality).vector().map(|v| v * scale)
    }

    #[test]
    fn scaled_template_matches_exactly() {
        let chroma = vec![template_frame(0, ChordQuality::Major, 3.5); 4];
        let chords = recognize_chords(&chroma, &[0.0, 4.0], &second_clock(), templates());

        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].chord_name, "Cmaj");
        assert!((chords[0].confidence - 1.0).abs() < 1e-9);
        assert_eq!(chords[0].rounded_confidence(), 1.0);
        assert_eq!(chords[0].start_time, 0.0);
        assert_eq!(chords[0].end_time, 4.0);
    }

    #[test]
    fn merge_identical_neighbours() {
        let provisional = vec![
            ChordSegment::new(0.0, 1.0, "Cmaj", 0.9),
            ChordSegment::new(1.0, 2.0, "Cmaj", 0.7),
            ChordSegment::new(2.0, 3.0, "Gmaj", 0.8),
        ];
        let merged = merge_segments(provisional);
        assert_eq!(
            merged,
            vec![
                ChordSegment::new(0.0, 2.0, "Cmaj", 0.9),
                ChordSegment::new(2.0, 3.0, "Gmaj", 0.8),
            ]
        );
    }

    #[test]
    fn merge_empty() {
        assert!(merge_segments(Vec::new()).is_empty());
    }

    #[test]
    fn progression_is_segmented_and_merged() {
        // C C G G Am
        let chroma = vec![
            template_frame(0, ChordQuality::Major, 1.0),
            template_frame(0, ChordQuality::Major, 2.0),
            template_frame(7, ChordQuality::Major, 1.0),
            template_frame(7, ChordQuality::Major, 1.0),
            template_frame(9, ChordQuality::Minor, 1.0),
        ];
        let beats = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let chords = recognize_chords(&chroma, &beats, &second_clock(), templates());

        let names: Vec<_> = chords.iter().map(|c| c.chord_name.as_str()).collect();
        assert_eq!(names, vec!["Cmaj", "Gmaj", "Amin"]);
        assert_eq!((chords[0].start_time, chords[0].end_time), (0.0, 2.0));
        assert_eq!((chords[1].start_time, chords[1].end_time), (2.0, 4.0));
        assert_eq!((chords[2].start_time, chords[2].end_time), (4.0, 5.0));

        for pair in chords.windows(2) {
            assert_ne!(pair[0].chord_name, pair[1].chord_name);
            assert!(pair[0].start_time < pair[1].start_time);
        }
        assert!(chords.iter().all(|c| c.start_time < c.end_time));
    }

    #[test]
    fn collapsed_beats_are_skipped() {
        let chroma = vec![template_frame(2, ChordQuality::Minor, 1.0); 4];
        // 1.2 and 1.7 land on the same frame
        let chords = recognize_chords(&chroma, &[1.2, 1.7, 3.0], &second_clock(), templates());
        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].chord_name, "Dmin");
        assert_eq!((chords[0].start_time, chords[0].end_time), (1.0, 3.0));
    }

    #[test]
    fn fewer_than_two_beats_is_empty() {
        let chroma = vec![template_frame(0, ChordQuality::Major, 1.0); 4];
        assert!(recognize_chords(&chroma, &[], &second_clock(), templates()).is_empty());
        assert!(recognize_chords(&chroma, &[1.0], &second_clock(), templates()).is_empty());
    }

    #[test]
    fn beats_past_the_end_are_clamped() {
        let chroma = vec![template_frame(5, ChordQuality::Suspended4, 1.0); 3];
        let chords = recognize_chords(&chroma, &[1.0, 6.0, 9.0], &second_clock(), templates());
        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].chord_name, "Fsus4");
        assert_eq!(chords[0].end_time, 6.0);
    }

    #[test]
    fn silent_interval_picks_first_template() {
        let chroma = vec![[0.0; 12]; 2];
        let chords = recognize_chords(&chroma, &[0.0, 2.0], &second_clock(), templates());
        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].chord_name, "Cmaj");
        assert_eq!(chords[0].confidence, 0.0);
    }

    #[test]
    fn classify_prefers_dominant_seventh_when_present() {
        let g7 = template_frame(7, ChordQuality::Dominant7, 1.0);
        let found = classify_chroma(&g7, templates()).unwrap();
        assert_eq!(found.template.name(), "G7");
    }

    #[test]
    fn mean_of_frames() {
        let mean = mean_chroma(&[[1.0; 12], [3.0; 12]]);
        assert_eq!(mean, [2.0; 12]);
        assert_eq!(mean_chroma(&[]), [0.0; 12]);
    }
}
