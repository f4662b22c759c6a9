use thiserror::Error;

/// Errors raised while building or driving the spectrum pipeline.
///
/// Everything here is a configuration or contract failure. Once a pipeline
/// has been constructed its buffer sizes are fixed, so none of these can
/// occur on the per-frame path for well-formed callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectrumError {
    #[error("transform size {0} is not a power of two (minimum 2)")]
    InvalidInputSize(usize),

    #[error("frame length {actual} does not match transform size {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("bucket step {0} must be a finite value greater than 1.0")]
    InvalidStep(f32),

    #[error("smoothness {0} must be finite and non-negative")]
    InvalidSmoothness(f32),

    #[error("channel {channel} is out of range for {channels}-channel audio")]
    ChannelOutOfRange { channel: usize, channels: usize },
}

/// Validates a transform size: a power of two, at least 2.
pub fn check_size(n: usize) -> Result<(), SpectrumError> {
    if n < 2 || !n.is_power_of_two() {
        return Err(SpectrumError::InvalidInputSize(n));
    }
    Ok(())
}

/// Validates that a frame has exactly the expected length.
pub fn check_len(expected: usize, actual: usize) -> Result<(), SpectrumError> {
    if expected != actual {
        return Err(SpectrumError::LengthMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_powers_of_two() {
        for k in 1..16 {
            assert!(check_size(1 << k).is_ok());
        }
    }

    #[test]
    fn rejects_other_sizes() {
        for n in [0usize, 1, 3, 6, 100, 8191] {
            assert_eq!(check_size(n), Err(SpectrumError::InvalidInputSize(n)));
        }
    }

    #[test]
    fn length_mismatch_reports_both_sizes() {
        let err = check_len(8, 7).unwrap_err();
        assert_eq!(err.to_string(), "frame length 7 does not match transform size 8");
    }
}
