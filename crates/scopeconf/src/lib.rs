//! Configuration loading for chordscope.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/chordscope/config.toml` (system)
//! 2. `~/.config/chordscope/config.toml` (user)
//! 3. `./chordscope.toml` or the `--config` path (local override)
//! 4. Environment variables (`CHORDSCOPE_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [analysis]
//! sample_rate = 22050
//! hop_length = 512
//! waveform_points = 500
//!
//! [export]
//! velocity = 64
//! channel = 0
//! default_bpm = 120.0
//!
//! [telemetry]
//! log_level = "info"
//!
//! [paths]
//! output_dir = "~/chords"
//! ```

pub mod loader;
pub mod settings;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use settings::{AnalysisConfig, ExportConfig, PathsConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete chordscope configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScopeConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

impl ScopeConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` replacing the local override.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = ScopeConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# chordscope configuration\n\n");

        output.push_str("[analysis]\n");
        output.push_str(&format!("sample_rate = {}\n", self.analysis.sample_rate));
        output.push_str(&format!("hop_length = {}\n", self.analysis.hop_length));
        output.push_str(&format!(
            "waveform_points = {}\n",
            self.analysis.waveform_points
        ));

        output.push_str("\n[export]\n");
        output.push_str(&format!("velocity = {}\n", self.export.velocity));
        output.push_str(&format!("channel = {}\n", self.export.channel));
        output.push_str(&format!("default_bpm = {:?}\n", self.export.default_bpm));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "log_level = \"{}\"\n",
            self.telemetry.log_level
        ));

        output.push_str("\n[paths]\n");
        output.push_str(&format!(
            "output_dir = \"{}\"\n",
            self.paths.output_dir.display()
        ));

        output
    }
}
