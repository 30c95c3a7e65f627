//! SampleBuffer: planar multi-channel f32 audio plus its sample rate.

use crate::error::EncodeError;

/// Normalized floating-point audio, one `Vec<f32>` per channel.
///
/// Every channel has the same length and the sample rate is non-zero; both
/// are checked on construction. Samples may leave [-1, 1] while a buffer
/// moves through the graph; the WAV encoder clamps them.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, EncodeError> {
        if channels.is_empty() {
            return Err(EncodeError::NoChannels);
        }
        if sample_rate == 0 {
            return Err(EncodeError::InvalidSampleRate(sample_rate));
        }
        let expected = channels[0].len();
        if let Some((channel, ch)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != expected)
        {
            return Err(EncodeError::ChannelLengthMismatch {
                expected,
                found: ch.len(),
                channel,
            });
        }
        Ok(SampleBuffer {
            channels,
            sample_rate,
        })
    }

    /// Wrap channels produced inside the crate, where equal lengths are
    /// guaranteed by construction.
    pub(crate) fn from_planar(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(!channels.is_empty());
        debug_assert!(channels.iter().all(|c| c.len() == channels[0].len()));
        SampleBuffer {
            channels,
            sample_rate: sample_rate.max(1),
        }
    }

    /// A zero-filled buffer. `channel_count` and `sample_rate` are raised to 1
    /// if given as zero.
    pub fn silent(channel_count: usize, frames: usize, sample_rate: u32) -> Self {
        SampleBuffer {
            channels: vec![vec![0.0; frames]; channel_count.max(1)],
            sample_rate: sample_rate.max(1),
        }
    }

    /// A zero-length buffer with the same layout as `other`.
    pub fn empty_like(other: &SampleBuffer) -> Self {
        Self::silent(other.channel_count(), 0, other.sample_rate)
    }

    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        SampleBuffer {
            channels: vec![samples],
            sample_rate: sample_rate.max(1),
        }
    }

    /// Split interleaved samples into channels. A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f32], channel_count: usize, sample_rate: u32) -> Self {
        let channel_count = channel_count.max(1);
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        SampleBuffer {
            channels,
            sample_rate: sample_rate.max(1),
        }
    }

    /// Number of frames (samples per channel).
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Frame-major sample order (L, R, L, R, ...).
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len() * self.channel_count());
        for i in 0..self.len() {
            for ch in &self.channels {
                out.push(ch[i]);
            }
        }
        out
    }

    /// RMS over all channels.
    pub fn rms(&self) -> f64 {
        let count = self.len() * self.channel_count();
        if count == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .channels
            .iter()
            .flat_map(|ch| ch.iter())
            .map(|&s| (s as f64) * (s as f64))
            .sum();
        (sum / count as f64).sqrt()
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .fold(0.0_f32, |m, &s| m.max(s.abs()))
    }

    /// Keep the first `frames` frames (no-op if already shorter).
    pub fn truncated(&self, frames: usize) -> SampleBuffer {
        let frames = frames.min(self.len());
        SampleBuffer {
            channels: self.channels.iter().map(|ch| ch[..frames].to_vec()).collect(),
            sample_rate: self.sample_rate,
        }
    }
}

/// Linear-interpolation resampler. Channel count is preserved.
pub fn resample_linear(buffer: &SampleBuffer, target_rate: u32) -> SampleBuffer {
    let target_rate = target_rate.max(1);
    if buffer.sample_rate == target_rate || buffer.is_empty() {
        return SampleBuffer {
            channels: buffer.channels.clone(),
            sample_rate: target_rate,
        };
    }

    let ratio = target_rate as f64 / buffer.sample_rate as f64;
    let out_len = (buffer.len() as f64 * ratio).round() as usize;
    let last = buffer.len() - 1;

    let channels = buffer
        .channels
        .iter()
        .map(|src| {
            (0..out_len)
                .map(|i| {
                    let pos = i as f64 / ratio;
                    let idx = pos as usize;
                    if idx >= last {
                        src[last]
                    } else {
                        let frac = (pos - idx as f64) as f32;
                        src[idx] * (1.0 - frac) + src[idx + 1] * frac
                    }
                })
                .collect()
        })
        .collect();

    SampleBuffer {
        channels,
        sample_rate: target_rate,
    }
}
