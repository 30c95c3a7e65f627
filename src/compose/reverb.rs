//! Synthetic reverb impulse responses.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::buffer::SampleBuffer;

/// Stereo decaying noise: `amp(i) = rand(-1, 1) · (1 - i/len)^decay`.
/// Each channel draws its own noise from one seeded stream, so the two
/// sides decorrelate but the response is reproducible.
pub fn impulse_response(seconds: f64, decay: f64, sample_rate: u32, seed: u64) -> SampleBuffer {
    let len = ((seconds.max(0.0) * sample_rate as f64).round() as usize).max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let channels = (0..2)
        .map(|_| {
            (0..len)
                .map(|i| {
                    let tail = (1.0 - i as f64 / len as f64).powf(decay);
                    (rng.gen_range(-1.0_f64..1.0) * tail) as f32
                })
                .collect::<Vec<f32>>()
        })
        .collect();
    SampleBuffer::from_planar(channels, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_and_layout() {
        let ir = impulse_response(2.0, 2.0, 24000, 7);
        assert_eq!(ir.len(), 48000);
        assert_eq!(ir.channel_count(), 2);
        assert_ne!(ir.channel(0), ir.channel(1));
    }

    #[test]
    fn decays_towards_the_end() {
        let ir = impulse_response(1.0, 2.0, 24000, 7);
        let energy = |from: usize, to: usize| -> f32 {
            ir.channel(0)[from..to].iter().map(|s| s * s).sum()
        };
        assert!(energy(0, 2400) > 10.0 * energy(21600, 24000));
    }

    #[test]
    fn seeded_and_reproducible() {
        assert_eq!(impulse_response(0.5, 3.0, 8000, 1), impulse_response(0.5, 3.0, 8000, 1));
        assert_ne!(impulse_response(0.5, 3.0, 8000, 1), impulse_response(0.5, 3.0, 8000, 2));
    }

    #[test]
    fn zero_length_still_has_a_tap() {
        assert_eq!(impulse_response(0.0, 2.0, 24000, 0).len(), 1);
    }
}
