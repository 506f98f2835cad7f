//! CLI command implementations

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use audio_understand::{loader, AnalysisEngine, AnalysisReport, ChordSegment, FeatureFile};
use chord_midi::{export_filename, result_to_midi, ExportOptions};
use scopeconf::ScopeConfig;
use tracing::{info, warn};

/// Where `analyze` writes its outputs.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOutputs {
    /// Report path; defaults to `<output_dir>/<audio stem>.json`
    pub report: Option<PathBuf>,
    /// Also write the chord MIDI next to the report
    pub midi: bool,
}

/// Files produced by one `analyze` run.
#[derive(Debug, Clone)]
pub struct AnalyzeSummary {
    pub report: AnalysisReport,
    pub report_path: PathBuf,
    pub midi_path: Option<PathBuf>,
}

pub fn export_options(config: &ScopeConfig) -> ExportOptions {
    ExportOptions {
        velocity: config.export.velocity,
        channel: config.export.channel,
        default_bpm: config.export.default_bpm,
    }
}

/// Analyze an audio file using precomputed features and write the report.
pub fn analyze(
    config: &ScopeConfig,
    audio_path: &Path,
    features_path: &Path,
    outputs: &AnalyzeOutputs,
) -> Result<AnalyzeSummary> {
    let features = FeatureFile::load(features_path)
        .with_context(|| format!("Failed to load features from {}", features_path.display()))?;
    if features.hop_length != config.analysis.hop_length {
        warn!(
            features = features.hop_length,
            configured = config.analysis.hop_length,
            "feature hop length differs from configuration, using the feature file's"
        );
    }

    let audio = loader::load(audio_path, config.analysis.sample_rate)
        .with_context(|| format!("Failed to load audio from {}", audio_path.display()))?;

    let engine = AnalysisEngine::new().waveform_points(config.analysis.waveform_points);
    let report = engine
        .analyze(&audio, &features)
        .with_context(|| format!("Analysis of {} failed", audio_path.display()))?;

    let report_path = match &outputs.report {
        Some(path) => path.clone(),
        None => {
            let stem = audio_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "track".to_string());
            config.paths.output_dir.join(format!("{}.json", stem))
        }
    };
    write_report(&report_path, &report)?;
    info!(path = %report_path.display(), "report written");

    let midi_path = if outputs.midi && report.result.chords.is_empty() {
        warn!(audio = %audio_path.display(), "no chords recognized, nothing to export");
        None
    } else if outputs.midi {
        let name = audio_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = report_path.parent().unwrap_or(Path::new("."));
        let path = dir.join(export_filename(&name));
        write_midi(config, &report, &path)?;
        Some(path)
    } else {
        None
    };

    Ok(AnalyzeSummary {
        report,
        report_path,
        midi_path,
    })
}

/// Relabel one chord of a saved report in place.
pub fn correct(report_path: &Path, index: usize, name: &str) -> Result<ChordSegment> {
    let mut report = read_report(report_path)?;
    let corrected = report
        .result
        .correct_chord(index, name)
        .with_context(|| {
            format!("Cannot correct chord {} in {}", index, report_path.display())
        })?
        .clone();
    write_report(report_path, &report)?;
    Ok(corrected)
}

/// Export a saved report's chords to a MIDI file.
///
/// Without `out`, writes `<report stem>_chords.mid` beside the report.
pub fn export(config: &ScopeConfig, report_path: &Path, out: Option<&Path>) -> Result<PathBuf> {
    let report = read_report(report_path)?;
    let path = match out {
        Some(path) => path.to_path_buf(),
        None => {
            let stem = report_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "track".to_string());
            report_path.with_file_name(format!("{}_chords.mid", stem))
        }
    };
    write_midi(config, &report, &path)?;
    Ok(path)
}

fn write_midi(config: &ScopeConfig, report: &AnalysisReport, path: &Path) -> Result<()> {
    if report.result.chords.is_empty() {
        bail!("No chords to export");
    }
    let bytes = result_to_midi(&report.result, &export_options(config))
        .context("Failed to encode MIDI")?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write MIDI to {}", path.display()))?;
    info!(path = %path.display(), "MIDI written");
    Ok(())
}

pub fn read_report(path: &Path) -> Result<AnalysisReport> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse report {}", path.display()))
}

fn write_report(path: &Path, report: &AnalysisReport) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
