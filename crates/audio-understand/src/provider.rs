//! Seam to the spectral feature extractor.
//!
//! Chroma extraction and beat tracking happen outside this crate. A
//! [`FeatureProvider`] hands the pipeline complete chroma matrices, a tempo
//! estimate and beat timestamps, and converts between frame indices and
//! seconds. [`FeatureFile`] is a provider backed by features precomputed by an
//! external extractor and saved as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{ChromaFrame, ChromaMatrix};

/// Analysis sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

/// Samples between consecutive chroma frames.
pub const DEFAULT_HOP_LENGTH: usize = 512;

/// Conversion between chroma frame indices and seconds.
pub trait FrameClock {
    fn frame_to_time(&self, frame: usize) -> f64;

    fn time_to_frame(&self, time: f64) -> usize;
}

/// Frame clock for a fixed hop size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopClock {
    pub sample_rate: u32,
    pub hop_length: usize,
}

impl HopClock {
    pub fn new(sample_rate: u32, hop_length: usize) -> Result<Self> {
        if sample_rate == 0 || hop_length == 0 {
            return Err(Error::DegenerateInput(format!(
                "frame clock needs a positive sample rate and hop length (got {} Hz, hop {})",
                sample_rate, hop_length
            )));
        }
        Ok(Self {
            sample_rate,
            hop_length,
        })
    }
}

impl Default for HopClock {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            hop_length: DEFAULT_HOP_LENGTH,
        }
    }
}

impl FrameClock for HopClock {
    fn frame_to_time(&self, frame: usize) -> f64 {
        (frame * self.hop_length) as f64 / self.sample_rate as f64
    }

    /// Truncates to the sample, then to the frame containing it. The small
    /// bias keeps `time_to_frame(frame_to_time(f)) == f` under float error.
    fn time_to_frame(&self, time: f64) -> usize {
        if !time.is_finite() || time <= 0.0 {
            return 0;
        }
        let sample = (time * self.sample_rate as f64 + 1e-9) as usize;
        sample / self.hop_length
    }
}

/// Which chroma extraction the pipeline is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChromaProfile {
    /// Fast STFT chroma used for global key estimation
    Coarse,
    /// Higher-resolution chroma used for chord segmentation
    Fine,
}

/// External feature extraction consumed by the analysis engine.
pub trait FeatureProvider {
    fn extract_chroma(
        &self,
        samples: &[f32],
        sample_rate: u32,
        profile: ChromaProfile,
    ) -> Result<ChromaMatrix>;

    /// Tempo in BPM and strictly increasing beat times in seconds.
    fn estimate_tempo_and_beats(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<(f64, Vec<f64>)>;

    /// Frame/time conversion consistent with the chroma hop size.
    fn clock(&self) -> &dyn FrameClock;
}

/// Features precomputed by an external extractor.
///
/// ```json
/// {
///   "sample_rate": 22050,
///   "hop_length": 512,
///   "tempo": 120.0,
///   "beat_times": [0.5, 1.0, 1.5],
///   "chroma_coarse": [[0.1, 0.0, ...12 values], ...],
///   "chroma_fine": [[...], ...]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFile {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    pub tempo: f64,
    pub beat_times: Vec<f64>,
    pub chroma_coarse: Vec<ChromaFrame>,
    pub chroma_fine: Vec<ChromaFrame>,
    #[serde(skip)]
    clock: HopClock,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_hop_length() -> usize {
    DEFAULT_HOP_LENGTH
}

impl FeatureFile {
    pub fn new(
        clock: HopClock,
        tempo: f64,
        beat_times: Vec<f64>,
        chroma_coarse: ChromaMatrix,
        chroma_fine: ChromaMatrix,
    ) -> Result<Self> {
        let features = Self {
            sample_rate: clock.sample_rate,
            hop_length: clock.hop_length,
            tempo,
            beat_times,
            chroma_coarse,
            chroma_fine,
            clock,
        };
        features.validate()?;
        Ok(features)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::AnalysisFailed(format!("reading feature file {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
            .map_err(|e| Error::AnalysisFailed(format!("{} ({})", e, path.display())))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let mut features: FeatureFile = serde_json::from_str(contents)
            .map_err(|e| Error::AnalysisFailed(format!("parsing feature file: {}", e)))?;
        features.clock = HopClock::new(features.sample_rate, features.hop_length)?;
        features.validate()?;
        Ok(features)
    }

    fn validate(&self) -> Result<()> {
        if let Some(pair) = self.beat_times.windows(2).find(|w| !(w[0] < w[1])) {
            return Err(Error::AnalysisFailed(format!(
                "beat times must be strictly increasing ({} then {})",
                pair[0], pair[1]
            )));
        }
        let negative = self
            .chroma_coarse
            .iter()
            .chain(self.chroma_fine.iter())
            .flatten()
            .any(|v| *v < 0.0);
        if negative {
            return Err(Error::AnalysisFailed(
                "chroma energies must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    fn check_rate(&self, sample_rate: u32) -> Result<()> {
        if sample_rate != self.sample_rate {
            return Err(Error::AnalysisFailed(format!(
                "features were extracted at {} Hz but audio is {} Hz",
                self.sample_rate, sample_rate
            )));
        }
        Ok(())
    }
}

impl FeatureProvider for FeatureFile {
    fn extract_chroma(
        &self,
        _samples: &[f32],
        sample_rate: u32,
        profile: ChromaProfile,
    ) -> Result<ChromaMatrix> {
        self.check_rate(sample_rate)?;
        Ok(match profile {
            ChromaProfile::Coarse => self.chroma_coarse.clone(),
            ChromaProfile::Fine => self.chroma_fine.clone(),
        })
    }

    fn estimate_tempo_and_beats(
        &self,
        _samples: &[f32],
        sample_rate: u32,
    ) -> Result<(f64, Vec<f64>)> {
        self.check_rate(sample_rate)?;
        Ok((self.tempo, self.beat_times.clone()))
    }

    fn clock(&self) -> &dyn FrameClock {
        &self.clock
    }
}
