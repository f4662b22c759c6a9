use crate::error::{check_len, SpectrumError};

pub const DEFAULT_SMOOTHNESS: f32 = 8.0;

/// Divides every value by `max_amp` so the loudest bucket lands on 1.0.
///
/// A non-positive (or non-finite) `max_amp` means there was nothing to scale
/// against; the curve is left untouched.
pub fn normalize(curve: &mut [f32], max_amp: f32) {
    let divisor = if max_amp > 0.0 && max_amp.is_finite() { max_amp } else { 1.0 };
    for value in curve.iter_mut() {
        *value /= divisor;
    }
}

/// Frame-rate independent single-pole low-pass over bucket values.
///
/// Each accumulator moves toward its target by `smoothness * dt` of the
/// remaining distance. The gain is clamped to `[0, 1]`, so a long frame
/// snaps to the target rather than overshooting it.
#[derive(Clone, Debug)]
pub struct TemporalSmoother {
    smoothness: f32,
    values: Vec<f32>,
}

impl TemporalSmoother {
    pub fn new(buckets: usize, smoothness: f32) -> Result<Self, SpectrumError> {
        if !smoothness.is_finite() || smoothness < 0.0 {
            return Err(SpectrumError::InvalidSmoothness(smoothness));
        }
        Ok(Self {
            smoothness,
            values: vec![0.0; buckets],
        })
    }

    pub fn smoothness(&self) -> f32 {
        self.smoothness
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn blend(&mut self, target: &[f32], dt: f32) -> Result<&[f32], SpectrumError> {
        check_len(self.values.len(), target.len())?;
        let gain = (self.smoothness * dt).clamp(0.0, 1.0);
        if gain > 0.0 {
            for (acc, &t) in self.values.iter_mut().zip(target) {
                *acc += (t - *acc) * gain;
            }
        }
        Ok(&self.values)
    }

    pub fn reset(&mut self) {
        self.values.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_peak_to_exactly_one() {
        let mut curve = vec![3.0, 12.5, 0.0, 7.0];
        normalize(&mut curve, 12.5);
        assert_eq!(curve.iter().copied().fold(f32::MIN, f32::max), 1.0);
        assert!((curve[0] - 0.24).abs() < 1e-6);
    }

    #[test]
    fn normalize_is_a_no_op_for_degenerate_max() {
        let original = vec![0.0, -1.0, 0.5];
        for max_amp in [0.0, -3.0, f32::NAN] {
            let mut curve = original.clone();
            normalize(&mut curve, max_amp);
            assert_eq!(curve, original);
        }
    }

    #[test]
    fn converges_monotonically_without_overshoot() {
        let mut smoother = TemporalSmoother::new(3, DEFAULT_SMOOTHNESS).unwrap();
        let target = vec![1.0; 3];
        let mut previous = 0.0f32;
        for _ in 0..600 {
            let v = smoother.blend(&target, 1.0 / 60.0).unwrap()[0];
            assert!(v >= previous);
            assert!(v <= 1.0);
            previous = v;
        }
        assert!((previous - 1.0).abs() < 1e-4);
    }

    #[test]
    fn long_frames_snap_instead_of_overshooting() {
        let mut smoother = TemporalSmoother::new(1, DEFAULT_SMOOTHNESS).unwrap();
        let v = smoother.blend(&[1.0], 0.5).unwrap()[0];
        assert_eq!(v, 1.0);
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        let mut smoother = TemporalSmoother::new(2, DEFAULT_SMOOTHNESS).unwrap();
        smoother.blend(&[0.4, 0.9], 1.0 / 30.0).unwrap();
        let before = smoother.values().to_vec();
        for _ in 0..10 {
            smoother.blend(&[5.0, -5.0], 0.0).unwrap();
        }
        assert_eq!(smoother.values(), before.as_slice());
    }

    #[test]
    fn reset_and_validation() {
        let mut smoother = TemporalSmoother::new(2, 4.0).unwrap();
        smoother.blend(&[1.0, 1.0], 0.1).unwrap();
        smoother.reset();
        assert_eq!(smoother.values(), &[0.0, 0.0]);

        assert!(smoother.blend(&[1.0], 0.1).is_err());
        assert_eq!(
            TemporalSmoother::new(2, -1.0).unwrap_err(),
            SpectrumError::InvalidSmoothness(-1.0)
        );
    }
}
