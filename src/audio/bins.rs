use std::ops::Range;
use std::sync::Arc;

use rustfft::num_complex::Complex;

use super::fft::amp;
use crate::error::{check_len, check_size, SpectrumError};

pub const DEFAULT_STEP: f32 = 1.06;

/// Groups FFT bins below Nyquist into geometrically widening buckets.
///
/// Boundaries depend only on the transform size and the step, so they are
/// walked once at construction and shared between clones.
#[derive(Clone, Debug)]
pub struct LogBinner {
    size: usize,
    step: f32,
    buckets: Arc<[Range<usize>]>,
}

impl LogBinner {
    pub fn new(size: usize, step: f32) -> Result<Self, SpectrumError> {
        check_size(size)?;
        if !step.is_finite() || step <= 1.0 {
            return Err(SpectrumError::InvalidStep(step));
        }
        Ok(Self {
            size,
            step,
            buckets: bucket_bounds(size, step).into(),
        })
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Bin ranges `[start, end)` of every bucket, lowest first.
    pub fn buckets(&self) -> &[Range<usize>] {
        &self.buckets
    }

    /// Fills `curve` with the peak [`amp`] of each bucket and returns the
    /// largest bucket value, folded from `floor`.
    ///
    /// Each bucket starts from 0, so bins with power below 1 (negative log)
    /// and silent bins (`ln 0`) never pull a bucket below zero.
    pub fn aggregate(
        &self,
        spectrum: &[Complex<f32>],
        curve: &mut [f32],
        floor: f32,
    ) -> Result<f32, SpectrumError> {
        check_len(self.size, spectrum.len())?;
        check_len(self.buckets.len(), curve.len())?;

        let mut max_amp = floor;
        for (value, range) in curve.iter_mut().zip(self.buckets.iter()) {
            let peak = spectrum[range.clone()]
                .iter()
                .map(|&z| amp(z))
                .fold(0.0f32, |a, b| if b > a { b } else { a });
            max_amp = max_amp.max(peak);
            *value = peak;
        }
        Ok(max_amp)
    }
}

/// Walks `f` from 1 by `ceil(f * step)` until it reaches `size / 2`.
pub fn bucket_bounds(size: usize, step: f32) -> Vec<Range<usize>> {
    let nyquist = size / 2;
    let mut buckets = Vec::new();
    let mut f = 1.0f32;
    while (f as usize) < nyquist {
        let next = (f * step).ceil();
        let start = f as usize;
        let end = (next as usize).min(nyquist);
        buckets.push(start..end);
        f = next;
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_for_small_frames() {
        assert!(bucket_bounds(2, DEFAULT_STEP).is_empty());
        assert_eq!(bucket_bounds(4, DEFAULT_STEP), vec![1..2]);

        let b = bucket_bounds(64, DEFAULT_STEP);
        assert_eq!(b.len(), 24);
        assert_eq!(b[15], 15..16);
        assert_eq!(b[16], 16..17);
        assert_eq!(b[17], 17..19);
        assert_eq!(b[23], 31..32);
    }

    #[test]
    fn bounds_tile_the_spectrum_below_nyquist() {
        for &n in &[1024usize, 8192] {
            let b = bucket_bounds(n, DEFAULT_STEP);
            assert_eq!(b[0].start, 1);
            assert_eq!(b.last().unwrap().end, n / 2);
            for pair in b.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
                assert!(pair[0].start < pair[0].end);
            }
        }
        assert_eq!(bucket_bounds(1024, DEFAULT_STEP).len(), 68);
        assert_eq!(bucket_bounds(8192, DEFAULT_STEP).len(), 104);
    }

    #[test]
    fn structure_is_independent_of_data() {
        let binner = LogBinner::new(256, DEFAULT_STEP).unwrap();
        let again = LogBinner::new(256, DEFAULT_STEP).unwrap();
        assert_eq!(binner.buckets(), again.buckets());

        let mut curve = vec![0.0; binner.bucket_count()];
        let loud = vec![Complex::new(10.0f32, 0.0); 256];
        let quiet = vec![Complex::new(0.0f32, 0.0); 256];
        binner.aggregate(&loud, &mut curve, 0.0).unwrap();
        binner.aggregate(&quiet, &mut curve, 0.0).unwrap();
        assert_eq!(binner.buckets(), again.buckets());
    }

    #[test]
    fn bucket_takes_peak_amp_and_ignores_sub_unit_power() {
        let binner = LogBinner::new(64, DEFAULT_STEP).unwrap();
        let mut spectrum = vec![Complex::new(0.0f32, 0.0); 64];
        // Bucket 17 spans bins 17..19.
        spectrum[17] = Complex::new(2.0, 0.0);
        spectrum[18] = Complex::new(0.0, 5.0);
        // Power below 1 has a negative log and must not lower bucket 3.
        spectrum[3] = Complex::new(0.1, 0.0);

        let mut curve = vec![0.0; binner.bucket_count()];
        let max_amp = binner.aggregate(&spectrum, &mut curve, 0.0).unwrap();

        assert!((curve[17] - 25.0f32.ln()).abs() < 1e-6);
        assert_eq!(curve[3], 0.0);
        assert!((max_amp - 25.0f32.ln()).abs() < 1e-6);
        assert!(curve.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn floor_seeds_the_running_maximum() {
        let binner = LogBinner::new(16, DEFAULT_STEP).unwrap();
        let mut spectrum = vec![Complex::new(0.0f32, 0.0); 16];
        spectrum[2] = Complex::new(1.5, 0.0);
        let mut curve = vec![0.0; binner.bucket_count()];

        let unfloored = binner.aggregate(&spectrum, &mut curve, 0.0).unwrap();
        assert!((unfloored - 2.25f32.ln()).abs() < 1e-6);

        let floored = binner.aggregate(&spectrum, &mut curve, 1.0).unwrap();
        assert_eq!(floored, 1.0);
    }

    #[test]
    fn rejects_non_growing_steps() {
        assert_eq!(LogBinner::new(64, 1.0).unwrap_err(), SpectrumError::InvalidStep(1.0));
        assert!(LogBinner::new(64, f32::NAN).is_err());
        assert!(LogBinner::new(60, DEFAULT_STEP).is_err());
    }
}
