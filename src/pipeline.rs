//! Request coordinator: audio bytes in, BVH bytes out.

use serde::Serialize;

use crate::audio::analysis;
use crate::encode::bvh;
use crate::error::PipelineError;
use crate::motion::skeleton::SKELETON;
use crate::motion::style::Style;
use crate::motion::synth;

/// Default cap on clip length, seconds.
pub const DEFAULT_MAX_DURATION_SECS: f64 = 30.0;
/// Default cap on upload size, megabytes.
pub const DEFAULT_MAX_SIZE_MB: usize = 10;

#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub style: Style,
    pub max_duration_secs: f64,
    pub max_input_bytes: usize,
}

impl GenerateOptions {
    /// Options with the size limit given in megabytes. Oversized limits saturate.
    pub fn new(style: Style, max_duration_secs: f64, max_size_mb: usize) -> Self {
        Self {
            style,
            max_duration_secs,
            max_input_bytes: max_size_mb.saturating_mul(1024 * 1024),
        }
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self::new(Style::Auto, DEFAULT_MAX_DURATION_SECS, DEFAULT_MAX_SIZE_MB)
    }
}

/// Pipeline stages, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Synthesize,
    Write,
}

impl Stage {
    pub const COUNT: u64 = 3;

    pub fn label(self) -> &'static str {
        match self {
            Stage::Extract => "Analyzing audio",
            Stage::Synthesize => "Synthesizing motion",
            Stage::Write => "Writing BVH",
        }
    }
}

/// Summary of a finished generation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerationReport {
    pub frame_count: usize,
    pub duration_seconds: f64,
    pub tempo_bpm: f64,
    pub beat_count: usize,
    pub style: Style,
    pub resolved_style: Style,
}

#[derive(Debug)]
pub struct Generated {
    pub bvh: Vec<u8>,
    pub report: GenerationReport,
}

/// Run extraction, synthesis and export on one clip.
///
/// `on_stage` is called as each stage starts. Any failure aborts the request
/// with nothing written.
pub fn generate(
    bytes: &[u8],
    options: &GenerateOptions,
    mut on_stage: impl FnMut(Stage),
) -> Result<Generated, PipelineError> {
    if bytes.len() > options.max_input_bytes {
        return Err(PipelineError::InputTooLarge {
            actual: bytes.len(),
            limit: options.max_input_bytes,
        });
    }

    on_stage(Stage::Extract);
    let features = analysis::extract(bytes, options.max_duration_secs)?;
    log::info!(
        "Features: {} frames, {:.2}s, tempo {:.1} BPM, {} beats",
        features.frame_count(),
        features.duration_seconds,
        features.tempo_bpm,
        features.beat_timestamps.len()
    );

    on_stage(Stage::Synthesize);
    let poses = synth::synthesize(&features, options.style)?;

    on_stage(Stage::Write);
    let bvh = bvh::write(&SKELETON, &poses)?;

    let report = GenerationReport {
        frame_count: poses.len(),
        duration_seconds: poses.duration(),
        tempo_bpm: features.tempo_bpm,
        beat_count: features.beat_timestamps.len(),
        style: options.style,
        resolved_style: options.style.resolve(features.tempo_bpm),
    };

    Ok(Generated { bvh, report })
}
