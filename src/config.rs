use serde::Deserialize;
use std::path::Path;

use crate::pipeline::{DEFAULT_MAX_DURATION_SECS, DEFAULT_MAX_SIZE_MB};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f64,
    #[serde(default = "default_max_size")]
    pub max_file_size_mb: usize,
}

#[derive(Debug, Deserialize)]
pub struct MotionConfig {
    #[serde(default = "default_style")]
    pub style: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub metadata: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration(),
            max_file_size_mb: default_max_size(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            style: default_style(),
        }
    }
}

fn default_max_duration() -> f64 { DEFAULT_MAX_DURATION_SECS }
fn default_max_size() -> usize { DEFAULT_MAX_SIZE_MB }
fn default_style() -> String { "auto".into() }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Option<Config> {
    match toml::from_str(content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::debug!("Config parse error: {}", err);
            None
        }
    }
}
