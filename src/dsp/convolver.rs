//! Convolution: FFT overlap-add against a fixed impulse response.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

const MIN_BLOCK: usize = 256;

/// Convolves whole channels against a pre-transformed impulse response.
/// Output is cut to the input length; the reverb tail past the end is dropped.
pub struct Convolver {
    ir_len: usize,
    block_len: usize,
    fft_len: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    /// One spectrum per impulse channel.
    spectra: Vec<Vec<Complex<f32>>>,
}

impl Convolver {
    /// Prepare `impulse` (one slice per channel). With `normalize` the
    /// response is scaled to unit energy per channel, so a noise IR neither
    /// explodes nor vanishes the signal.
    pub fn new(impulse: &[Vec<f32>], normalize: bool) -> Self {
        let ir_len = impulse.iter().map(|c| c.len()).max().unwrap_or(0);
        let block_len = ir_len.max(MIN_BLOCK).next_power_of_two();
        let fft_len = block_len * 2;

        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let scale = if normalize {
            let energy: f64 = impulse
                .iter()
                .flat_map(|c| c.iter())
                .map(|&s| (s as f64) * (s as f64))
                .sum::<f64>()
                / impulse.len().max(1) as f64;
            if energy > 0.0 {
                (1.0 / energy.sqrt()) as f32
            } else {
                1.0
            }
        } else {
            1.0
        };

        let spectra = impulse
            .iter()
            .map(|ch| {
                let mut buf = vec![Complex::new(0.0, 0.0); fft_len];
                for (slot, &s) in buf.iter_mut().zip(ch) {
                    slot.re = s * scale;
                }
                forward.process(&mut buf);
                buf
            })
            .collect();

        Convolver {
            ir_len,
            block_len,
            fft_len,
            forward,
            inverse,
            spectra,
        }
    }

    /// Convolve one channel against impulse channel `ir_channel`
    /// (wrapped around the impulse's channel count).
    pub fn process(&self, input: &[f32], ir_channel: usize) -> Vec<f32> {
        let n = input.len();
        let mut out = vec![0.0_f32; n];
        if self.ir_len == 0 || self.spectra.is_empty() {
            return out;
        }

        let spectrum = &self.spectra[ir_channel % self.spectra.len()];
        let norm = 1.0 / self.fft_len as f32;
        let mut scratch = vec![Complex::new(0.0_f32, 0.0); self.fft_len];

        for start in (0..n).step_by(self.block_len) {
            let end = (start + self.block_len).min(n);
            scratch.fill(Complex::new(0.0, 0.0));
            for (slot, &s) in scratch.iter_mut().zip(&input[start..end]) {
                slot.re = s;
            }
            self.forward.process(&mut scratch);
            for (x, h) in scratch.iter_mut().zip(spectrum) {
                *x *= *h;
            }
            self.inverse.process(&mut scratch);

            let stop = (start + self.fft_len).min(n);
            for (o, x) in out[start..stop].iter_mut().zip(&scratch) {
                *o += x.re * norm;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(input: &[f32], ir: &[f32]) -> Vec<f32> {
        (0..input.len())
            .map(|n| {
                (0..ir.len())
                    .filter(|&k| k <= n)
                    .map(|k| input[n - k] * ir[k])
                    .sum()
            })
            .collect()
    }

    #[test]
    fn impulse_reproduces_response() {
        let ir = vec![0.5, -0.25, 0.125, 0.0, 1.0];
        let conv = Convolver::new(&[ir.clone()], false);
        let mut input = vec![0.0; 16];
        input[3] = 1.0;
        let out = conv.process(&input, 0);
        for (k, &h) in ir.iter().enumerate() {
            assert!((out[3 + k] - h).abs() < 1e-5, "tap {k}: {} vs {h}", out[3 + k]);
        }
        assert!(out[..3].iter().all(|s| s.abs() < 1e-5));
    }

    #[test]
    fn matches_direct_form_across_blocks() {
        let ir: Vec<f32> = (0..300).map(|i| ((i * 37 % 17) as f32 - 8.0) / 40.0).collect();
        let input: Vec<f32> = (0..2000).map(|i| ((i * 13 % 23) as f32 - 11.0) / 11.0).collect();
        let conv = Convolver::new(&[ir.clone()], false);
        let fast = conv.process(&input, 0);
        let slow = direct(&input, &ir);
        assert_eq!(fast.len(), input.len());
        for (i, (a, b)) in fast.iter().zip(&slow).enumerate() {
            assert!((a - b).abs() < 1e-3, "sample {i}: {a} vs {b}");
        }
    }

    #[test]
    fn normalized_response_has_unit_energy() {
        let ir: Vec<f32> = (0..1000).map(|i| if i % 2 == 0 { 3.0 } else { -3.0 }).collect();
        let conv = Convolver::new(&[ir], true);
        let mut input = vec![0.0; 2000];
        input[0] = 1.0;
        let out = conv.process(&input, 0);
        let energy: f32 = out.iter().map(|s| s * s).sum();
        assert!((energy - 1.0).abs() < 1e-3, "energy {energy}");
    }

    #[test]
    fn empty_impulse_is_silent() {
        let conv = Convolver::new(&[], true);
        assert_eq!(conv.process(&[1.0, 0.5], 0), vec![0.0, 0.0]);
    }

    #[test]
    fn channel_index_wraps() {
        let conv = Convolver::new(&[vec![1.0], vec![-1.0]], false);
        let out = conv.process(&[0.5, 0.25], 3);
        assert!((out[0] + 0.5).abs() < 1e-6);
        assert!((out[1] + 0.25).abs() < 1e-6);
    }
}
