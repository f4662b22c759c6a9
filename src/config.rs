use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::audio::bins::DEFAULT_STEP;
use crate::audio::fft::Backend;
use crate::audio::smoothing::DEFAULT_SMOOTHNESS;
use crate::encode::curve::OutputFormat;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Parameters of the spectrum pipeline, fixed for a pipeline's lifetime.
#[derive(Clone, Debug, Deserialize)]
pub struct AnalysisConfig {
    /// Ring buffer and transform size; must be a power of two
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    /// Geometric growth factor between bucket edges
    #[serde(default = "default_step")]
    pub step: f32,
    /// How fast the displayed curve chases the newest frame (per second)
    #[serde(default = "default_smoothness")]
    pub smoothness: f32,
    #[serde(default)]
    pub backend: Backend,
    /// Starting value for the per-frame peak. 1.0 reproduces the classic
    /// plateau where frames quieter than `ln(power) = 1` are not stretched.
    #[serde(default)]
    pub max_amp_floor: f32,
    /// Which channel of interleaved input is analyzed
    #[serde(default)]
    pub channel: usize,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            step: default_step(),
            smoothness: default_smoothness(),
            backend: Backend::default(),
            max_amp_floor: 0.0,
            channel: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            format: OutputFormat::default(),
        }
    }
}

fn default_fft_size() -> usize { 1 << 13 }
fn default_step() -> f32 { DEFAULT_STEP }
fn default_smoothness() -> f32 { DEFAULT_SMOOTHNESS }
fn default_fps() -> u32 { 60 }

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).context("Invalid config file")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_config(&content)
}
