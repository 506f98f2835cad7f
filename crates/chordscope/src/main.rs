//! chordscope - chord, key and tempo analysis CLI
//!
//! Subcommands:
//! - `chordscope analyze <audio> --features <json>` - Analyze a track
//! - `chordscope correct <report> <index> <name>` - Relabel one chord
//! - `chordscope export <report>` - Write the chords as a MIDI file
//! - `chordscope config` - Show the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use chordscope::commands::{self, AnalyzeOutputs};
use chordscope::telemetry;
use clap::{Parser, Subcommand};
use scopeconf::ScopeConfig;

#[derive(Parser)]
#[command(name = "chordscope")]
#[command(about = "Chord, key and tempo analysis with MIDI export")]
#[command(version)]
struct Cli {
    /// Config file (replaces ./chordscope.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an audio track
    Analyze {
        /// Audio file to analyze (wav, mp3, flac, ogg, m4a)
        audio: PathBuf,

        /// Precomputed features (JSON: tempo, beat_times, chroma_coarse, chroma_fine)
        #[arg(short, long)]
        features: PathBuf,

        /// Report path (default: <output_dir>/<audio stem>.json)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Also export the chords as MIDI
        #[arg(long)]
        midi: bool,
    },

    /// Relabel one chord of a saved report
    Correct {
        /// Report written by `analyze`
        report: PathBuf,

        /// Zero-based chord index
        index: usize,

        /// New chord name
        name: String,
    },

    /// Export a saved report's chords as a MIDI file
    Export {
        /// Report written by `analyze`
        report: PathBuf,

        /// Output path (default: <report stem>_chords.mid)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show the effective configuration and where it came from
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = ScopeConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    telemetry::init(&config.telemetry.log_level);

    match cli.command {
        Commands::Analyze {
            audio,
            features,
            out,
            midi,
        } => {
            let outputs = AnalyzeOutputs { report: out, midi };
            let summary = commands::analyze(&config, &audio, &features, &outputs)?;
            let result = &summary.report.result;
            println!("Tempo: {:.1} BPM", result.tempo);
            println!("Key:   {}", result.key);
            for (i, chord) in result.chords.iter().enumerate() {
                println!(
                    "{:>3}  {:>7.2}-{:<7.2} {:<6} {:.2}",
                    i,
                    chord.start_time,
                    chord.end_time,
                    chord.chord_name,
                    chord.rounded_confidence()
                );
            }
            println!("Report: {}", summary.report_path.display());
            if let Some(path) = summary.midi_path {
                println!("MIDI:   {}", path.display());
            }
        }
        Commands::Correct {
            report,
            index,
            name,
        } => {
            let chord = commands::correct(&report, index, &name)?;
            println!(
                "Chord {} is now {} ({:.2}-{:.2})",
                index, chord.chord_name, chord.start_time, chord.end_time
            );
        }
        Commands::Export { report, out } => {
            let path = commands::export(&config, &report, out.as_deref())?;
            println!("{}", path.display());
        }
        Commands::Config => {
            if sources.files.is_empty() {
                println!("# No config files found, using defaults");
            }
            for file in &sources.files {
                println!("# Loaded: {}", file.display());
            }
            for var in &sources.env_overrides {
                println!("# Env override: {}", var);
            }
            println!("{}", config.to_toml());
        }
    }

    Ok(())
}
