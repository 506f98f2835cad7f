use std::path::PathBuf;

/// Errors from audio analysis.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source audio could not be read or decoded. Aborts the whole analysis.
    #[error("failed to decode audio {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Not enough material to produce any output.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// A manual chord edit was refused; the result is unchanged.
    #[error("correction rejected: {0}")]
    CorrectionRejected(String),

    #[error("analysis failed: {0}")]
    AnalysisFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
