use crate::error::SpectrumError;

/// Fixed-capacity history of the most recent samples.
///
/// Always holds exactly `capacity` samples; starts zero-filled so a cold
/// buffer reads as silence. Writes go to a circular head index, and
/// [`snapshot_into`](Self::snapshot_into) restores oldest-to-newest order.
#[derive(Clone, Debug)]
pub struct SampleRingBuffer {
    samples: Vec<f32>,
    /// Slot the next push will overwrite, which is also the oldest sample.
    head: usize,
}

impl SampleRingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn push(&mut self, sample: f32) {
        if self.samples.is_empty() {
            return;
        }
        self.samples[self.head] = sample;
        self.head = (self.head + 1) % self.samples.len();
    }

    pub fn extend(&mut self, samples: &[f32]) {
        let cap = self.samples.len();
        if cap == 0 {
            return;
        }
        // Only the last `cap` samples of a long batch survive anyway.
        let tail = &samples[samples.len().saturating_sub(cap)..];
        for &s in tail {
            self.samples[self.head] = s;
            self.head += 1;
            if self.head == cap {
                self.head = 0;
            }
        }
    }

    /// Pushes one channel out of interleaved frames (`[l, r, l, r, ...]`).
    /// A trailing partial frame is ignored.
    pub fn push_interleaved(
        &mut self,
        frames: &[f32],
        channels: usize,
        channel: usize,
    ) -> Result<(), SpectrumError> {
        if channel >= channels {
            return Err(SpectrumError::ChannelOutOfRange { channel, channels });
        }
        for frame in frames.chunks_exact(channels) {
            self.push(frame[channel]);
        }
        Ok(())
    }

    /// Copies the buffer into `dst` oldest-first. `dst` must have the
    /// buffer's capacity.
    pub fn snapshot_into(&self, dst: &mut [f32]) -> Result<(), SpectrumError> {
        crate::error::check_len(self.samples.len(), dst.len())?;
        let (newer, older) = self.samples.split_at(self.head);
        dst[..older.len()].copy_from_slice(older);
        dst[older.len()..].copy_from_slice(newer);
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<f32> {
        let (newer, older) = self.samples.split_at(self.head);
        let mut out = Vec::with_capacity(self.samples.len());
        out.extend_from_slice(older);
        out.extend_from_slice(newer);
        out
    }

    pub fn clear(&mut self) {
        self.samples.fill(0.0);
        self.head = 0;
    }
}
