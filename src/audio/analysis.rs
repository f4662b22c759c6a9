use anyhow::Result;
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::bins::LogBinner;
use super::decode::AudioData;
use super::features::{BucketInfo, CurveFrame, SpectrumLayout};
use super::fft::{build_transform, SpectralTransform};
use super::ring::SampleRingBuffer;
use super::smoothing::{normalize, TemporalSmoother};
use super::window::Windower;
use crate::config::AnalysisConfig;
use crate::error::SpectrumError;

/// Ring buffer shared between an audio producer and the frame consumer.
pub type SharedRing = Arc<Mutex<SampleRingBuffer>>;

pub(crate) fn lock(ring: &Mutex<SampleRingBuffer>) -> MutexGuard<'_, SampleRingBuffer> {
    // A panicking producer cannot leave the ring in an invalid state.
    ring.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stateless half of the pipeline: window, transform, bucket, normalize.
///
/// Owns its scratch buffers; clone one per worker thread.
#[derive(Clone, Debug)]
pub struct SpectrumAnalyzer {
    windower: Windower,
    transform: Arc<dyn SpectralTransform>,
    binner: LogBinner,
    max_amp_floor: f32,
    windowed: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Result<Self, SpectrumError> {
        let n = config.fft_size;
        Ok(Self {
            windower: Windower::new(n)?,
            transform: build_transform(config.backend, n)?,
            binner: LogBinner::new(n, config.step)?,
            max_amp_floor: config.max_amp_floor,
            windowed: vec![0.0; n],
            spectrum: vec![Complex::new(0.0, 0.0); n],
        })
    }

    pub fn fft_size(&self) -> usize {
        self.windower.size()
    }

    pub fn bucket_count(&self) -> usize {
        self.binner.bucket_count()
    }

    /// Computes the normalized log-magnitude curve of one ring snapshot.
    pub fn log_curve(&mut self, snapshot: &[f32], curve: &mut [f32]) -> Result<(), SpectrumError> {
        self.windower.apply(snapshot, &mut self.windowed)?;
        self.transform.transform(&self.windowed, &mut self.spectrum)?;
        let max_amp = self.binner.aggregate(&self.spectrum, curve, self.max_amp_floor)?;
        normalize(curve, max_amp);
        Ok(())
    }

    pub fn layout(&self, sample_rate: u32) -> SpectrumLayout {
        let n = self.fft_size();
        let hz = |bin: usize| bin as f32 * sample_rate as f32 / n as f32;
        SpectrumLayout {
            fft_size: n,
            sample_rate,
            step: self.binner.step(),
            buckets: self
                .binner
                .buckets()
                .iter()
                .map(|r| BucketInfo {
                    start_bin: r.start,
                    end_bin: r.end,
                    low_hz: hz(r.start),
                    high_hz: hz(r.end),
                })
                .collect(),
        }
    }
}

/// The real-time analyzer: ring buffer in, smoothed bucket curve out.
///
/// Audio collaborators call the `ingest*` methods (possibly from another
/// thread through [`ring_handle`](Self::ring_handle)); the presentation side
/// calls [`compute_frame`](Self::compute_frame) once per rendered frame.
#[derive(Debug)]
pub struct SpectrumPipeline {
    ring: SharedRing,
    channel: usize,
    snapshot: Vec<f32>,
    analyzer: SpectrumAnalyzer,
    curve: Vec<f32>,
    smoother: TemporalSmoother,
}

impl SpectrumPipeline {
    pub fn new(config: &AnalysisConfig) -> Result<Self, SpectrumError> {
        let analyzer = SpectrumAnalyzer::new(config)?;
        let buckets = analyzer.bucket_count();
        log::debug!(
            "Spectrum pipeline: N={}, step={}, {} buckets, backend={:?}",
            config.fft_size,
            config.step,
            buckets,
            config.backend
        );
        Ok(Self {
            ring: Arc::new(Mutex::new(SampleRingBuffer::new(config.fft_size))),
            channel: config.channel,
            snapshot: vec![0.0; config.fft_size],
            analyzer,
            curve: vec![0.0; buckets],
            smoother: TemporalSmoother::new(buckets, config.smoothness)?,
        })
    }

    pub fn ingest(&self, sample: f32) {
        lock(&self.ring).push(sample);
    }

    pub fn ingest_slice(&self, samples: &[f32]) {
        lock(&self.ring).extend(samples);
    }

    /// Pushes the configured channel of interleaved frames.
    pub fn ingest_interleaved(&self, frames: &[f32], channels: usize) -> Result<(), SpectrumError> {
        lock(&self.ring).push_interleaved(frames, channels, self.channel)
    }

    /// Handle for a producer running on another thread.
    pub fn ring_handle(&self) -> SharedRing {
        Arc::clone(&self.ring)
    }

    /// Runs one frame of the pipeline and returns the smoothed curve.
    ///
    /// `dt` is the wall-clock time since the previous frame, in seconds.
    pub fn compute_frame(&mut self, dt: f32) -> Result<&[f32], SpectrumError> {
        lock(&self.ring).snapshot_into(&mut self.snapshot)?;
        self.analyzer.log_curve(&self.snapshot, &mut self.curve)?;
        self.smoother.blend(&self.curve, dt)
    }

    /// Last unsmoothed, normalized curve.
    pub fn log_curve(&self) -> &[f32] {
        &self.curve
    }

    pub fn smoothed(&self) -> &[f32] {
        self.smoother.values()
    }

    pub fn bucket_count(&self) -> usize {
        self.analyzer.bucket_count()
    }

    pub fn layout(&self, sample_rate: u32) -> SpectrumLayout {
        self.analyzer.layout(sample_rate)
    }

    /// Forgets all history, e.g. when the source stream changes.
    pub fn reset(&mut self) {
        lock(&self.ring).clear();
        self.curve.fill(0.0);
        self.smoother.reset();
    }
}

/// Number of output frames needed to cover `frames` samples at `fps`.
pub fn frame_count(frames: usize, sample_rate: u32, fps: u32) -> usize {
    if sample_rate == 0 {
        return 0;
    }
    (frames as u64 * fps as u64).div_ceil(sample_rate as u64) as usize
}

/// Sample frames consumed by the time output frame `index` is computed.
pub fn frame_end(index: usize, sample_rate: u32, fps: u32, frames: usize) -> usize {
    let end = (index as u64 + 1) * sample_rate as u64 / fps.max(1) as u64;
    (end as usize).min(frames)
}

fn check_channel(audio: &AudioData, channel: usize) -> Result<(), SpectrumError> {
    if channel >= audio.channels {
        return Err(SpectrumError::ChannelOutOfRange {
            channel,
            channels: audio.channels,
        });
    }
    Ok(())
}

/// Feeds decoded audio through a [`SpectrumPipeline`] on a virtual clock,
/// one `1/fps` tick at a time. Returns the number of frames produced.
pub fn stream<F>(audio: &AudioData, fps: u32, config: &AnalysisConfig, mut on_frame: F) -> Result<usize>
where
    F: FnMut(CurveFrame) -> Result<()>,
{
    check_channel(audio, config.channel)?;
    let mut pipeline = SpectrumPipeline::new(config)?;
    let total = frame_count(audio.frames(), audio.sample_rate, fps);
    let dt = 1.0 / fps as f32;
    let ch = audio.channels;

    log::info!("Streaming {} frames at {} fps...", total, fps);

    let mut fed = 0;
    for i in 0..total {
        let end = frame_end(i, audio.sample_rate, fps, audio.frames());
        pipeline.ingest_interleaved(&audio.samples[fed * ch..end * ch], ch)?;
        fed = end;

        let bars = pipeline.compute_frame(dt)?.to_vec();
        on_frame(CurveFrame {
            frame: i,
            time: end as f32 / audio.sample_rate as f32,
            bars,
        })?;
    }

    Ok(total)
}

/// Offline equivalent of [`stream`]: per-frame curves are computed in
/// parallel, then smoothed in order. Produces the same frames.
pub fn analyze(audio: &AudioData, fps: u32, config: &AnalysisConfig) -> Result<Vec<CurveFrame>> {
    check_channel(audio, config.channel)?;
    let analyzer = SpectrumAnalyzer::new(config)?;
    let n = analyzer.fft_size();
    let buckets = analyzer.bucket_count();
    let total = frame_count(audio.frames(), audio.sample_rate, fps);

    log::info!("Pass 1: Per-frame spectra ({} frames, N={})...", total, n);
    let curves = (0..total)
        .into_par_iter()
        .map_init(
            || (analyzer.clone(), vec![0.0f32; n]),
            |(analyzer, snapshot), i| {
                let end = frame_end(i, audio.sample_rate, fps, audio.frames());
                fill_snapshot(audio, config.channel, end, snapshot);
                let mut curve = vec![0.0f32; buckets];
                analyzer.log_curve(snapshot, &mut curve)?;
                Ok::<_, SpectrumError>((end, curve))
            },
        )
        .collect::<Result<Vec<_>, SpectrumError>>()?;

    log::info!("Pass 2: Temporal smoothing (smoothness={:.2})...", config.smoothness);
    let mut smoother = TemporalSmoother::new(buckets, config.smoothness)?;
    let dt = 1.0 / fps as f32;
    let mut frames = Vec::with_capacity(total);
    for (i, (end, curve)) in curves.into_iter().enumerate() {
        let bars = smoother.blend(&curve, dt)?.to_vec();
        frames.push(CurveFrame {
            frame: i,
            time: end as f32 / audio.sample_rate as f32,
            bars,
        });
    }

    Ok(frames)
}

/// The ring contents after `end` frames: the last N samples of `channel`,
/// zero-padded in front when fewer have arrived.
fn fill_snapshot(audio: &AudioData, channel: usize, end: usize, snapshot: &mut [f32]) {
    let n = snapshot.len();
    let start = end.saturating_sub(n);
    let pad = n - (end - start);
    snapshot[..pad].fill(0.0);
    for (dst, frame) in snapshot[pad..].iter_mut().zip(start..end) {
        *dst = audio.samples[frame * audio.channels + channel];
    }
}
