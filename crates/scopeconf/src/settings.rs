//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Analysis parameters shared with the feature extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Rate audio is resampled to before analysis.
    /// Default: 22050
    #[serde(default = "AnalysisConfig::default_sample_rate")]
    pub sample_rate: u32,

    /// Samples between chroma frames; must match the extractor.
    /// Default: 512
    #[serde(default = "AnalysisConfig::default_hop_length")]
    pub hop_length: usize,

    /// Length of the display waveform.
    /// Default: 500
    #[serde(default = "AnalysisConfig::default_waveform_points")]
    pub waveform_points: usize,
}

impl AnalysisConfig {
    fn default_sample_rate() -> u32 {
        22050
    }

    fn default_hop_length() -> usize {
        512
    }

    fn default_waveform_points() -> usize {
        500
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: Self::default_sample_rate(),
            hop_length: Self::default_hop_length(),
            waveform_points: Self::default_waveform_points(),
        }
    }
}

/// MIDI export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Default: 64
    #[serde(default = "ExportConfig::default_velocity")]
    pub velocity: u8,

    /// Default: 0
    #[serde(default)]
    pub channel: u8,

    /// Tempo written when analysis produced none.
    /// Default: 120.0
    #[serde(default = "ExportConfig::default_bpm")]
    pub default_bpm: f64,
}

impl ExportConfig {
    fn default_velocity() -> u8 {
        64
    }

    fn default_bpm() -> f64 {
        120.0
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            velocity: Self::default_velocity(),
            channel: 0,
            default_bpm: Self::default_bpm(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where analysis results and MIDI exports are written.
    /// Default: current directory
    #[serde(default = "PathsConfig::default_output_dir")]
    pub output_dir: PathBuf,
}

impl PathsConfig {
    fn default_output_dir() -> PathBuf {
        PathBuf::from(".")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: Self::default_output_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let analysis = AnalysisConfig::default();
        assert_eq!(analysis.sample_rate, 22050);
        assert_eq!(analysis.hop_length, 512);
        assert_eq!(analysis.waveform_points, 500);

        let export = ExportConfig::default();
        assert_eq!(export.velocity, 64);
        assert_eq!(export.channel, 0);
        assert_eq!(export.default_bpm, 120.0);

        assert_eq!(TelemetryConfig::default().log_level, "info");
        assert_eq!(PathsConfig::default().output_dir, PathBuf::from("."));
    }

    #[test]
    fn partial_section_fills_defaults() {
        let analysis: AnalysisConfig = toml::from_str("hop_length = 1024").unwrap();
        assert_eq!(analysis.hop_length, 1024);
        assert_eq!(analysis.sample_rate, 22050);
    }
}
