// Error types for the pattern engine.
//
// Only configuration problems are errors. An empty candidate set (a scale and
// range that admit no pitch) is not: generators emit an all-rest pattern and
// log it. A silent pattern after mutation is repaired in place by
// `mutation::ensure_audible` and never surfaces here.

use crate::voice::VoiceId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A scale with no intervals, or an interval outside 0..=11.
    #[error("invalid scale: {reason}")]
    InvalidScale { reason: String },

    #[error("unknown scale name: {0}")]
    UnknownScale(String),

    /// Voice length outside the supported step range.
    #[error("invalid voice length {length} (expected {min}..={max})")]
    InvalidLength {
        length: usize,
        min: usize,
        max: usize,
    },

    #[error("invalid pitch range: min {min} is above max {max}")]
    InvalidPitchRange { min: i32, max: i32 },

    #[error("invalid density {0} (expected 0.0..=1.0)")]
    InvalidDensity(f64),

    #[error("invalid tail length {tail_length} (expected at most {max})")]
    InvalidTailLength { tail_length: usize, max: usize },

    #[error("unknown voice: {0}")]
    UnknownVoice(VoiceId),

    /// The engine configuration JSON could not be parsed.
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
