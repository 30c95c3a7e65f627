//! Mixer: a stereo summing bus of fixed length.

use crate::buffer::SampleBuffer;

/// Accumulates audio from several sources into a left/right pair.
/// Writes past the end are dropped, so sources may overrun freely.
#[derive(Debug, Clone)]
pub struct Mixer {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl Mixer {
    pub fn new(frames: usize) -> Self {
        Mixer {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    /// Add a mono sample at `index` with per-side gains.
    #[inline]
    pub fn add(&mut self, index: usize, sample: f32, (gain_l, gain_r): (f32, f32)) {
        if index < self.left.len() {
            self.left[index] += sample * gain_l;
            self.right[index] += sample * gain_r;
        }
    }

    /// Add a sample to both sides at full level.
    #[inline]
    pub fn add_centered(&mut self, index: usize, sample: f32) {
        self.add(index, sample, (1.0, 1.0));
    }

    /// Sum a whole buffer in from frame 0, scaled by `gain`. Mono sources
    /// feed both sides; extra channels past the second are ignored.
    pub fn add_buffer(&mut self, source: &SampleBuffer, gain: f32) {
        let left = source.channel(0);
        let right = if source.channel_count() > 1 {
            source.channel(1)
        } else {
            left
        };
        for (out, &s) in self.left.iter_mut().zip(left) {
            *out += s * gain;
        }
        for (out, &s) in self.right.iter_mut().zip(right) {
            *out += s * gain;
        }
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// The mixed stereo buffer.
    pub fn into_buffer(self, sample_rate: u32) -> SampleBuffer {
        SampleBuffer::from_planar(vec![self.left, self.right], sample_rate)
    }
}
