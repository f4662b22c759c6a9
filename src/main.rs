mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use cli::{Cli, Mode};
use spectra::audio::analysis::{self, SpectrumPipeline};
use spectra::audio::fft::Backend;
use spectra::audio::{decode, realtime};
use spectra::config;
use spectra::encode::curve::{CurveWriter, OutputFormat};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect spectra.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("spectra.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("spectra").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("spectra").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    if let Some(ref path) = config_path {
        match config::load_config(path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                // Merge: config values apply only when CLI is at its default
                if cli.fps == 60 { cli.fps = cfg.output.fps.max(1); }
                if cli.format == OutputFormat::Jsonl { cli.format = cfg.output.format; }
                if cli.fft_size == 8192 { cli.fft_size = cfg.analysis.fft_size; }
                if cli.step == 1.06 { cli.step = cfg.analysis.step; }
                if cli.smoothness == 8.0 { cli.smoothness = cfg.analysis.smoothness; }
                if cli.backend == Backend::Recursive { cli.backend = cfg.analysis.backend; }
                if cli.max_amp_floor == 0.0 { cli.max_amp_floor = cfg.analysis.max_amp_floor; }
                if cli.channel == 0 { cli.channel = cfg.analysis.channel; }
            }
            Err(err) => log::warn!("Failed to load config from {}: {:#}", path.display(), err),
        }
    }

    let settings = cli.analysis_config();

    // List buckets mode
    if cli.list_buckets {
        let pipeline = SpectrumPipeline::new(&settings)?;
        let layout = pipeline.layout(cli.sample_rate);
        println!(
            "{} buckets (N={}, step={}, {} Hz):",
            layout.buckets.len(),
            layout.fft_size,
            layout.step,
            layout.sample_rate
        );
        for (i, b) in layout.buckets.iter().enumerate() {
            println!(
                "  {:>3}  bins {:>5}..{:<5} {:>9.1} - {:>9.1} Hz",
                i, b.start_bin, b.end_bin, b.low_hz, b.high_hz
            );
        }
        return Ok(());
    }

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("spectra - log-frequency spectrum analyzer");
    log::info!("Input: {}", input.display());
    log::info!("Output: {} ({:?})", cli.output.display(), cli.format);
    log::info!(
        "Pipeline: N={} step={} smoothness={} backend={:?} @ {}fps",
        settings.fft_size, settings.step, settings.smoothness, settings.backend, cli.fps
    );

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio_data = decode::decode_audio(input)?;

    // 2. Run the pipeline and write frames as they come
    let mut writer = CurveWriter::create(&cli.output, cli.format)?;
    let total_frames = analysis::frame_count(audio_data.frames(), audio_data.sample_rate, cli.fps);

    let frames_written = match cli.mode {
        Mode::Batch => {
            let frames = analysis::analyze(&audio_data, cli.fps, &settings)?;
            let pb = progress_bar(frames.len())?;
            for frame in &frames {
                writer.write_frame(frame)?;
                pb.inc(1);
            }
            pb.finish_with_message("Analysis complete");
            frames.len()
        }
        Mode::Stream => {
            let pb = progress_bar(total_frames)?;
            let count = analysis::stream(&audio_data, cli.fps, &settings, |frame| {
                writer.write_frame(&frame)?;
                pb.inc(1);
                Ok(())
            })?;
            pb.finish_with_message("Analysis complete");
            count
        }
        Mode::Realtime => realtime::run(&audio_data, cli.fps, &settings, |frame| {
            writer.write_frame(&frame)
        })?,
    };

    // 3. Flush output
    writer.finish()?;

    log::info!("Done! {} frames -> {}", frames_written, cli.output.display());
    Ok(())
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );
    Ok(pb)
}
