//! Wall-clock driver: a producer thread plays decoded audio into the shared
//! ring at its natural rate while the caller's thread renders frames.

use anyhow::{anyhow, bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use super::analysis::{lock, SharedRing, SpectrumPipeline};
use super::decode::AudioData;
use super::features::CurveFrame;
use crate::config::AnalysisConfig;
use crate::error::SpectrumError;

/// Producer chunk length, roughly one hardware audio callback.
const CHUNK_MS: u64 = 10;

fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if deadline > now {
        thread::sleep(deadline - now);
    }
}

/// Raises the stop flag when the consumer leaves `run`, including on `?`.
struct StopOnDrop<'a>(&'a AtomicBool);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

fn play(
    ring: SharedRing,
    audio: &AudioData,
    channel: usize,
    start: Instant,
    stop: &AtomicBool,
) -> Result<(), SpectrumError> {
    let chunk_frames = (audio.sample_rate as u64 * CHUNK_MS / 1000).max(1) as usize;
    let ch = audio.channels;
    for (i, chunk) in audio.samples.chunks(chunk_frames * ch).enumerate() {
        if stop.load(Ordering::Relaxed) {
            log::debug!("Audio producer stopped after {} chunks", i);
            break;
        }
        let offset = (i * chunk_frames) as f64 / audio.sample_rate as f64;
        sleep_until(start + Duration::from_secs_f64(offset));
        lock(&ring).push_interleaved(chunk, ch, channel)?;
    }
    Ok(())
}

/// Renders frames at `fps` until the audio has played out. `dt` for each frame
/// is measured, not assumed, so late ticks are smoothed correctly.
pub fn run<F>(audio: &AudioData, fps: u32, config: &AnalysisConfig, mut on_frame: F) -> Result<usize>
where
    F: FnMut(CurveFrame) -> Result<()>,
{
    if config.channel >= audio.channels {
        return Err(SpectrumError::ChannelOutOfRange {
            channel: config.channel,
            channels: audio.channels,
        }
        .into());
    }
    if audio.sample_rate == 0 {
        bail!("Cannot play audio with a sample rate of 0");
    }

    let mut pipeline = SpectrumPipeline::new(config)?;
    let ring = pipeline.ring_handle();
    let tick = Duration::from_secs_f64(1.0 / fps.max(1) as f64);

    log::info!(
        "Playing {:.1}s of audio in real time at {} fps...",
        audio.duration(),
        fps
    );

    let channel = config.channel;
    let stop = AtomicBool::new(false);
    let start = Instant::now();
    thread::scope(|scope| -> Result<usize> {
        let stop = &stop;
        let producer = scope.spawn(move || play(ring, audio, channel, start, stop));
        let _guard = StopOnDrop(stop);

        let mut frames = 0usize;
        let mut last = start;
        loop {
            // Checked before rendering so the last frame sees all the audio.
            let finished = producer.is_finished();
            sleep_until(start + tick * (frames as u32 + 1));

            let now = Instant::now();
            let dt = (now - last).as_secs_f32();
            last = now;

            let bars = pipeline.compute_frame(dt)?.to_vec();
            log::debug!("frame {} dt={:.4}s", frames, dt);
            on_frame(CurveFrame {
                frame: frames,
                time: (now - start).as_secs_f32(),
                bars,
            })?;
            frames += 1;

            if finished {
                break;
            }
        }

        producer
            .join()
            .map_err(|_| anyhow!("Audio producer thread panicked"))??;
        Ok(frames)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plays_short_clip_to_completion() {
        let sample_rate = 8000;
        let samples: Vec<f32> = (0..sample_rate / 10)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sample_rate as f32).sin())
            .collect();
        let audio = AudioData {
            samples,
            channels: 1,
            sample_rate,
        };
        let config = AnalysisConfig {
            fft_size: 256,
            ..AnalysisConfig::default()
        };

        let mut frames = Vec::new();
        let count = run(&audio, 100, &config, |frame| {
            frames.push(frame);
            Ok(())
        })
        .unwrap();

        assert_eq!(count, frames.len());
        assert!(count >= 2);
        let last = frames.last().unwrap();
        assert_eq!(last.bars.len(), 45);
        assert!(last.bars.iter().all(|v| v.is_finite()));
        assert!(last.bars.iter().any(|&v| v > 0.0));
        for pair in frames.windows(2) {
            assert!(pair[1].time >= pair[0].time);
        }
    }

    #[test]
    fn sink_error_stops_playback_early() {
        let sample_rate = 8000;
        let audio = AudioData {
            samples: vec![0.25; sample_rate as usize * 3],
            channels: 1,
            sample_rate,
        };
        let config = AnalysisConfig {
            fft_size: 256,
            ..AnalysisConfig::default()
        };

        let started = Instant::now();
        let result = run(&audio, 30, &config, |_| Err(anyhow!("sink closed")));
        let elapsed = started.elapsed();

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "sink closed");
        assert!(elapsed < Duration::from_secs(1), "run took {:?}", elapsed);
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let audio = AudioData {
            samples: vec![0.0; 16],
            channels: 1,
            sample_rate: 0,
        };
        assert!(run(&audio, 30, &AnalysisConfig::default(), |_| Ok(())).is_err());
    }

    #[test]
    fn rejects_missing_channel() {
        let audio = AudioData {
            samples: vec![0.0; 16],
            channels: 1,
            sample_rate: 8000,
        };
        let config = AnalysisConfig {
            channel: 3,
            ..AnalysisConfig::default()
        };
        assert!(run(&audio, 30, &config, |_| Ok(())).is_err());
    }
}
