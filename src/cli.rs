use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use spectra::audio::fft::Backend;
use spectra::config::AnalysisConfig;
use spectra::encode::curve::OutputFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Feed the pipeline tick by tick on a virtual clock
    Stream,
    /// Compute every frame's spectrum in parallel, then smooth
    Batch,
    /// Play the audio on a producer thread and render at wall-clock pace
    Realtime,
}

#[derive(Parser, Debug)]
#[command(name = "spectra", about = "Smoothed log-frequency spectrum curves for audio visualizers")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Output file for curve frames ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,

    /// Output encoding
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Jsonl)]
    pub format: OutputFormat,

    /// How the audio is driven through the pipeline
    #[arg(short, long, value_enum, default_value_t = Mode::Stream)]
    pub mode: Mode,

    /// Frames per second
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    pub fps: u32,

    /// Ring buffer / FFT size (power of two)
    #[arg(long, default_value_t = 8192)]
    pub fft_size: usize,

    /// Geometric step between bucket edges (> 1.0)
    #[arg(long, default_value_t = 1.06)]
    pub step: f32,

    /// Smoothing responsiveness per second (higher = snappier)
    #[arg(long, default_value_t = 8.0)]
    pub smoothness: f32,

    /// FFT implementation
    #[arg(long, value_enum, default_value_t = Backend::Recursive)]
    pub backend: Backend,

    /// Seed for the per-frame peak used in normalization
    #[arg(long, default_value_t = 0.0)]
    pub max_amp_floor: f32,

    /// Channel of the input to analyze
    #[arg(long, default_value_t = 0)]
    pub channel: usize,

    /// Config file (defaults to spectra.toml or ~/.config/spectra/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the bucket layout for --fft-size / --step and exit
    #[arg(long)]
    pub list_buckets: bool,

    /// Sample rate used to label buckets with --list-buckets
    #[arg(long, default_value_t = 44100)]
    pub sample_rate: u32,
}

impl Cli {
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            fft_size: self.fft_size,
            step: self.step,
            smoothness: self.smoothness,
            backend: self.backend,
            max_amp_floor: self.max_amp_floor,
            channel: self.channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_analysis_defaults() {
        let cli = Cli::parse_from(["spectra", "song.flac"]);
        let from_cli = cli.analysis_config();
        let defaults = AnalysisConfig::default();
        assert_eq!(from_cli.fft_size, defaults.fft_size);
        assert_eq!(from_cli.step, defaults.step);
        assert_eq!(from_cli.smoothness, defaults.smoothness);
        assert_eq!(from_cli.backend, defaults.backend);
        assert_eq!(cli.mode, Mode::Stream);
        assert_eq!(cli.output, PathBuf::from("-"));
    }

    #[test]
    fn parses_enums_and_rejects_zero_fps() {
        let cli = Cli::parse_from([
            "spectra", "a.wav", "--mode", "batch", "--backend", "planned", "-f", "raw",
        ]);
        assert_eq!(cli.mode, Mode::Batch);
        assert_eq!(cli.backend, Backend::Planned);
        assert_eq!(cli.format, OutputFormat::Raw);

        assert!(Cli::try_parse_from(["spectra", "a.wav", "--fps", "0"]).is_err());
    }
}
