use std::sync::Arc;

use crate::error::{check_len, check_size, SpectrumError};

/// Hann window over a fixed frame size, with the coefficients computed once.
///
/// Tapering the slice to zero at both ends keeps the edge discontinuity of a
/// finite snapshot from leaking into every bin.
#[derive(Clone, Debug)]
pub struct Windower {
    coefficients: Arc<[f32]>,
}

impl Windower {
    pub fn new(size: usize) -> Result<Self, SpectrumError> {
        check_size(size)?;
        Ok(Self {
            coefficients: hann_window(size).into(),
        })
    }

    pub fn size(&self) -> usize {
        self.coefficients.len()
    }

    /// Writes `input[i] * window(i)` into `output`.
    pub fn apply(&self, input: &[f32], output: &mut [f32]) -> Result<(), SpectrumError> {
        check_len(self.size(), input.len())?;
        check_len(self.size(), output.len())?;
        for ((out, &s), &w) in output.iter_mut().zip(input).zip(self.coefficients.iter()) {
            *out = s * w;
        }
        Ok(())
    }
}

/// `0.5 - 0.5 * cos(2*pi*i / (N - 1))` for `i` in `0..N`.
pub fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}
