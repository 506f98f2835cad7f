//! Config file discovery, loading, and environment variable overlay.

use crate::settings::{AnalysisConfig, ExportConfig, PathsConfig, TelemetryConfig};
use crate::{ConfigError, ScopeConfig};
use serde::de::DeserializeOwned;
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/chordscope/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("chordscope/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("chordscope.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<ScopeConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse config from a TOML string. Missing sections take their defaults.
pub(crate) fn parse_toml(contents: &str, path: &Path) -> Result<ScopeConfig, ConfigError> {
    let table = contents
        .parse::<toml::Table>()
        .map_err(|e| parse_error(path, e.to_string()))?;

    Ok(ScopeConfig {
        analysis: section(&table, "analysis", path)?,
        export: section(&table, "export", path)?,
        telemetry: section(&table, "telemetry", path)?,
        paths: section(&table, "paths", path)?,
    })
}

fn section<T: DeserializeOwned + Default>(
    table: &toml::Table,
    name: &str,
    path: &Path,
) -> Result<T, ConfigError> {
    match table.get(name) {
        Some(value) => value
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| parse_error(path, format!("[{}]: {}", name, e))),
        None => Ok(T::default()),
    }
}

fn parse_error(path: &Path, message: String) -> ConfigError {
    ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    }
}

fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

/// Merge two configs, with non-default `overlay` values taking precedence.
pub fn merge_configs(base: ScopeConfig, overlay: ScopeConfig) -> ScopeConfig {
    let analysis = AnalysisConfig::default();
    let export = ExportConfig::default();

    ScopeConfig {
        analysis: AnalysisConfig {
            sample_rate: pick(
                base.analysis.sample_rate,
                overlay.analysis.sample_rate,
                analysis.sample_rate,
            ),
            hop_length: pick(
                base.analysis.hop_length,
                overlay.analysis.hop_length,
                analysis.hop_length,
            ),
            waveform_points: pick(
                base.analysis.waveform_points,
                overlay.analysis.waveform_points,
                analysis.waveform_points,
            ),
        },
        export: ExportConfig {
            velocity: pick(base.export.velocity, overlay.export.velocity, export.velocity),
            channel: pick(base.export.channel, overlay.export.channel, export.channel),
            default_bpm: pick(
                base.export.default_bpm,
                overlay.export.default_bpm,
                export.default_bpm,
            ),
        },
        telemetry: TelemetryConfig {
            log_level: pick(
                base.telemetry.log_level,
                overlay.telemetry.log_level,
                TelemetryConfig::default().log_level,
            ),
        },
        paths: PathsConfig {
            output_dir: pick(
                base.paths.output_dir,
                overlay.paths.output_dir,
                PathsConfig::default().output_dir,
            ),
        },
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut ScopeConfig, sources: &mut ConfigSources) {
    apply_overrides(config, sources, |key| env::var(key).ok());
}

/// Override application with an injectable lookup, so tests need not touch
/// the process environment.
pub(crate) fn apply_overrides(
    config: &mut ScopeConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(rate) = lookup("CHORDSCOPE_SAMPLE_RATE").and_then(|v| v.parse().ok()) {
        config.analysis.sample_rate = rate;
        sources.env_overrides.push("CHORDSCOPE_SAMPLE_RATE".to_string());
    }
    if let Some(hop) = lookup("CHORDSCOPE_HOP_LENGTH").and_then(|v| v.parse().ok()) {
        config.analysis.hop_length = hop;
        sources.env_overrides.push("CHORDSCOPE_HOP_LENGTH".to_string());
    }
    if let Some(points) = lookup("CHORDSCOPE_WAVEFORM_POINTS").and_then(|v| v.parse().ok()) {
        config.analysis.waveform_points = points;
        sources.env_overrides.push("CHORDSCOPE_WAVEFORM_POINTS".to_string());
    }

    if let Some(velocity) = lookup("CHORDSCOPE_VELOCITY").and_then(|v| v.parse().ok()) {
        config.export.velocity = velocity;
        sources.env_overrides.push("CHORDSCOPE_VELOCITY".to_string());
    }
    if let Some(bpm) = lookup("CHORDSCOPE_DEFAULT_BPM").and_then(|v| v.parse().ok()) {
        config.export.default_bpm = bpm;
        sources.env_overrides.push("CHORDSCOPE_DEFAULT_BPM".to_string());
    }

    if let Some(dir) = lookup("CHORDSCOPE_OUTPUT_DIR") {
        config.paths.output_dir = expand_path(&dir);
        sources.env_overrides.push("CHORDSCOPE_OUTPUT_DIR".to_string());
    }

    if let Some(level) = lookup("CHORDSCOPE_LOG_LEVEL") {
        config.telemetry.log_level = level;
        sources.env_overrides.push("CHORDSCOPE_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(level) = lookup("RUST_LOG") {
        config.telemetry.log_level = level;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
