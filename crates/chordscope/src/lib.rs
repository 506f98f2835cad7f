//! chordscope - chord, key and tempo analysis from the command line
//!
//! - `commands`: analyze, correct and export implementations
//! - `telemetry`: log subscriber setup

pub mod commands;
pub mod telemetry;
