pub mod analyzer;
pub mod chord_templates;
pub mod chords;
pub mod correction;
pub mod correlate;
pub mod error;
pub mod key;
pub mod loader;
pub mod provider;
pub mod types;
pub mod waveform;

pub use analyzer::{AudioAnalyzer, TemplateAnalyzer};
pub use chord_templates::{templates, ChordTemplate, ChordTemplateSet};
pub use correction::apply_correction;
pub use error::{Error, Result};
pub use key::{detect_key, KeyEstimate, ToneProfile, UNKNOWN_KEY};
pub use provider::{ChromaProfile, FeatureFile, FeatureProvider, FrameClock, HopClock};
pub use types::{
    AnalysisReport, AnalysisResult, ChordQuality, ChordSegment, ChromaFrame, ChromaMatrix,
    KeyMode, SampleBuffer, WaveformEnvelope,
};
pub use waveform::summarize_waveform;

use std::sync::Arc;

use tracing::{info, warn};

/// Pipeline stages, in execution order. Callers that report progress or
/// support cancellation do so between these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Beats,
    Key,
    Chords,
    Waveform,
    Finalize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Beats => "detecting tempo & beats",
            Stage::Key => "detecting key",
            Stage::Chords => "recognizing chords",
            Stage::Waveform => "summarizing waveform",
            Stage::Finalize => "finalizing",
        };
        f.write_str(name)
    }
}

/// Audio analysis engine.
///
/// Runs beat tracking, key estimation, chord recognition and waveform
/// summarization over one loaded track. Holds no per-track state, so one
/// engine can analyze any number of tracks.
pub struct AnalysisEngine {
    analyzer: Arc<dyn AudioAnalyzer>,
    waveform_points: usize,
}

impl AnalysisEngine {
    /// Create with the default template analyzer.
    pub fn new() -> Self {
        Self::with_analyzer(Arc::new(TemplateAnalyzer::default()))
    }

    /// Create with a custom analyzer (for testing or another backend).
    pub fn with_analyzer(analyzer: Arc<dyn AudioAnalyzer>) -> Self {
        Self {
            analyzer,
            waveform_points: waveform::DEFAULT_POINTS,
        }
    }

    pub fn waveform_points(mut self, points: usize) -> Self {
        self.waveform_points = points;
        self
    }

    /// Analyze a loaded track with features from `provider`.
    ///
    /// Provider failures abort the analysis. Degenerate material yields an
    /// empty chord list and an "N/A" key rather than an error.
    pub fn analyze(
        &self,
        audio: &SampleBuffer,
        provider: &dyn FeatureProvider,
    ) -> Result<AnalysisReport> {
        let samples = &audio.samples;
        let rate = audio.sample_rate;

        info!(stage = %Stage::Beats, samples = samples.len(), sample_rate = rate);
        let (tempo, beat_times) = provider.estimate_tempo_and_beats(samples, rate)?;
        if !(tempo > 0.0) {
            warn!(tempo, "provider returned a non-positive tempo");
        }

        info!(stage = %Stage::Key);
        let coarse = provider.extract_chroma(samples, rate, ChromaProfile::Coarse)?;
        let key = self.analyzer.analyze_key(&coarse);

        info!(stage = %Stage::Chords, beats = beat_times.len());
        let fine = provider.extract_chroma(samples, rate, ChromaProfile::Fine)?;
        let chords = self
            .analyzer
            .extract_chords(&fine, &beat_times, provider.clock());

        info!(stage = %Stage::Waveform, points = self.waveform_points);
        let waveform = summarize_waveform(samples, self.waveform_points);

        info!(
            stage = %Stage::Finalize,
            tempo,
            key = %key,
            chords = chords.len(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            result: AnalysisResult { tempo, key, chords },
            waveform,
            duration: audio.duration(),
        })
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
