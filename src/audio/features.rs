use serde::Serialize;

/// One output frame: the smoothed, normalized bucket curve at `time`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurveFrame {
    pub frame: usize,
    /// Seconds of audio consumed when the frame was computed
    pub time: f32,
    /// Bar heights, lowest bucket first (0.0-1.0 for non-silent input)
    pub bars: Vec<f32>,
}

/// Frequency span of one bucket.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BucketInfo {
    pub start_bin: usize,
    pub end_bin: usize,
    pub low_hz: f32,
    pub high_hz: f32,
}

/// Bucket geometry for a given transform size and sample rate, for labelling bars.
#[derive(Clone, Debug, Serialize)]
pub struct SpectrumLayout {
    pub fft_size: usize,
    pub sample_rate: u32,
    pub step: f32,
    pub buckets: Vec<BucketInfo>,
}

impl SpectrumLayout {
    /// Index of the bucket whose span contains `hz`.
    pub fn bucket_for(&self, hz: f32) -> Option<usize> {
        self.buckets
            .iter()
            .position(|b| b.low_hz <= hz && hz < b.high_hz)
    }
}
