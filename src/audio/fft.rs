//! Real-to-complex transforms for the analysis pipeline.
//!
//! [`RecursiveFft`] is the radix-2 decimation-in-time Cooley-Tukey transform
//! the pipeline runs by default. [`PlannedFft`] wraps a `rustfft` plan behind
//! the same trait and can be selected from configuration.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner, Length};

use crate::error::{check_len, check_size, SpectrumError};

/// A fixed-size forward transform from real samples to complex bins.
///
/// Implementations are immutable after construction so one instance can be
/// shared across worker threads.
pub trait SpectralTransform: Send + Sync + fmt::Debug {
    /// Transform size N; always a power of two.
    fn size(&self) -> usize;

    /// Transforms `input` (N reals) into `output` (N complex values).
    fn transform(&self, input: &[f32], output: &mut [Complex<f32>]) -> Result<(), SpectrumError>;
}

/// Which transform implementation the pipeline should build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Recursive,
    Planned,
}

pub fn build_transform(
    backend: Backend,
    size: usize,
) -> Result<Arc<dyn SpectralTransform>, SpectrumError> {
    Ok(match backend {
        Backend::Recursive => Arc::new(RecursiveFft::new(size)?),
        Backend::Planned => Arc::new(PlannedFft::new(size)?),
    })
}

/// Recursive radix-2 FFT over index ranges.
///
/// Twiddles for the full size are evaluated once in `f64` and stored as
/// `f32`. A sub-transform of length `n` at stride `s` uses entry `k * s`,
/// which equals `exp(-2*pi*i*k/n)` because `n * s == N`.
#[derive(Clone, Debug)]
pub struct RecursiveFft {
    size: usize,
    twiddles: Vec<Complex<f32>>,
}

impl RecursiveFft {
    pub fn new(size: usize) -> Result<Self, SpectrumError> {
        check_size(size)?;
        let twiddles = (0..size / 2)
            .map(|k| {
                let angle = -2.0 * PI * k as f64 / size as f64;
                Complex::new(angle.cos() as f32, angle.sin() as f32)
            })
            .collect();
        Ok(Self { size, twiddles })
    }

    /// Transforms `input[offset], input[offset + stride], ...` into `out`,
    /// whose length is the number of elements in that strided run.
    fn recurse(&self, input: &[f32], offset: usize, stride: usize, out: &mut [Complex<f32>]) {
        let n = out.len();
        if n == 1 {
            out[0] = Complex::new(input[offset], 0.0);
            return;
        }

        let half = n / 2;
        {
            let (evens, odds) = out.split_at_mut(half);
            self.recurse(input, offset, stride * 2, evens);
            self.recurse(input, offset + stride, stride * 2, odds);
        }

        for k in 0..half {
            let twiddle = self.twiddles[k * stride];
            let even = out[k];
            let odd = twiddle * out[k + half];
            out[k] = even + odd;
            out[k + half] = even - odd;
        }
    }
}

impl SpectralTransform for RecursiveFft {
    fn size(&self) -> usize {
        self.size
    }

    fn transform(&self, input: &[f32], output: &mut [Complex<f32>]) -> Result<(), SpectrumError> {
        check_len(self.size, input.len())?;
        check_len(self.size, output.len())?;
        self.recurse(input, 0, 1, output);
        Ok(())
    }
}

/// `rustfft` plan behind the [`SpectralTransform`] seam.
pub struct PlannedFft {
    fft: Arc<dyn Fft<f32>>,
}

impl PlannedFft {
    pub fn new(size: usize) -> Result<Self, SpectrumError> {
        check_size(size)?;
        let mut planner = FftPlanner::<f32>::new();
        Ok(Self {
            fft: planner.plan_fft_forward(size),
        })
    }
}

impl fmt::Debug for PlannedFft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannedFft").field("size", &self.fft.len()).finish()
    }
}

impl SpectralTransform for PlannedFft {
    fn size(&self) -> usize {
        self.fft.len()
    }

    fn transform(&self, input: &[f32], output: &mut [Complex<f32>]) -> Result<(), SpectrumError> {
        check_len(self.size(), input.len())?;
        check_len(self.size(), output.len())?;
        for (out, &s) in output.iter_mut().zip(input) {
            *out = Complex::new(s, 0.0);
        }
        self.fft.process(output);
        Ok(())
    }
}

/// Natural log of the power `re^2 + im^2` (not of the magnitude).
///
/// A zero coefficient yields negative infinity; the binner ignores it.
pub fn amp(z: Complex<f32>) -> f32 {
    z.norm_sqr().ln()
}
