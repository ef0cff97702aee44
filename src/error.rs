//! Error types for each pipeline stage.
//!
//! Every error is terminal for the request that raised it: nothing downstream
//! runs and no partial output is produced.

use thiserror::Error;

/// Supported containers/codecs, listed in decode error messages.
pub const SUPPORTED_FORMATS: &str = "WAV, MP3, FLAC, OGG/Vorbis, AAC";

/// Feature extraction failures.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("feature extraction: failed to decode audio: {reason}\n  Supported formats: {SUPPORTED_FORMATS}")]
    Decode { reason: String },

    #[error("feature extraction: unsupported audio layout ({channels} channels @ {sample_rate} Hz): {reason}")]
    UnsupportedFormat {
        channels: usize,
        sample_rate: u32,
        reason: String,
    },

    #[error("feature extraction: audio is {actual:.2}s long, limit is {limit:.2}s")]
    DurationExceeded { actual: f64, limit: f64 },
}

impl ExtractError {
    pub fn decode(reason: impl Into<String>) -> Self {
        ExtractError::Decode {
            reason: reason.into(),
        }
    }
}

/// Motion synthesis failures.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("motion synthesis: invalid feature set: {0}")]
    InvalidFeatureSet(String),

    #[error("motion synthesis: unknown style '{label}' (expected one of: {expected})")]
    UnknownStyle { label: String, expected: String },
}

/// BVH serialization failures.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("motion export: pose sequence has no frames")]
    EmptySequence,

    #[error("motion export: frame {frame} has {found} joint rotations, skeleton has {expected} joints")]
    SkeletonMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },

    #[error("motion export: frame rate must be positive, got {0}")]
    InvalidFrameRate(u32),

    #[error("motion export: frame {frame} contains a non-finite value")]
    NonFiniteValue { frame: usize },
}

/// BVH reader failures.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("bvh line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("bvh: unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("bvh: {0}")]
    Inconsistent(String),
}

/// Errors surfaced by the request coordinator.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input is {actual} bytes, limit is {limit} bytes")]
    InputTooLarge { actual: usize, limit: usize },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
