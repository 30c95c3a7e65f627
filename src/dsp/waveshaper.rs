//! Waveshaper: static transfer curve with optional oversampling,
//! following WebAudio `WaveShaperNode` curve lookup.

use std::f64::consts::PI;

use super::filter::{BiquadFilter, FilterType};

/// Number of points in the soft-clip curve.
pub const CURVE_POINTS: usize = 44100;

/// Soft-clip transfer curve:
/// `y(x) = (3 + k)·x·20·(π/180) / (π + k·|x|)` sampled at `x_i = 2i/N - 1`.
pub fn soft_clip_curve(drive: f64, points: usize) -> Vec<f32> {
    let k = drive;
    let deg = PI / 180.0;
    (0..points)
        .map(|i| {
            let x = i as f64 * 2.0 / points as f64 - 1.0;
            ((3.0 + k) * x * 20.0 * deg / (PI + k * x.abs())) as f32
        })
        .collect()
}

/// Look up `x` on `curve` with linear interpolation. Inputs beyond [-1, 1]
/// take the end values.
#[inline]
pub fn shape(curve: &[f32], x: f32) -> f32 {
    match curve.len() {
        0 => x,
        1 => curve[0],
        n => {
            let v = (n - 1) as f32 * 0.5 * (x + 1.0);
            if !(v > 0.0) {
                curve[0]
            } else if v >= (n - 1) as f32 {
                curve[n - 1]
            } else {
                let k = v as usize;
                let f = v - k as f32;
                curve[k] * (1.0 - f) + curve[k + 1] * f
            }
        }
    }
}

/// One channel of waveshaping. With `oversample > 1` the input is
/// upsampled by linear interpolation, shaped, low-passed below the original
/// Nyquist and decimated back.
#[derive(Debug, Clone)]
pub struct WaveShaper<'c> {
    curve: &'c [f32],
    oversample: usize,
    previous: f32,
    anti_alias: [BiquadFilter; 2],
}

impl<'c> WaveShaper<'c> {
    pub fn new(curve: &'c [f32], oversample: usize, sample_rate: f64) -> Self {
        let oversample = oversample.clamp(1, 8);
        let inner_rate = sample_rate * oversample as f64;
        let cutoff = 0.45 * sample_rate;
        let lp = BiquadFilter::with_params(FilterType::Lowpass, inner_rate, cutoff, 0.707, 0.0);
        WaveShaper {
            curve,
            oversample,
            previous: 0.0,
            anti_alias: [lp.clone(), lp],
        }
    }

    pub fn process_block(&mut self, samples: &mut [f32]) {
        if self.oversample == 1 {
            for s in samples.iter_mut() {
                *s = shape(self.curve, *s);
            }
            return;
        }

        let factor = self.oversample as f32;
        for s in samples.iter_mut() {
            let current = *s;
            let mut out = 0.0;
            for j in 1..=self.oversample {
                let x = self.previous + (current - self.previous) * (j as f32 / factor);
                let mut y = shape(self.curve, x) as f64;
                for lp in self.anti_alias.iter_mut() {
                    y = lp.process(y);
                }
                out = y as f32;
            }
            self.previous = current;
            *s = out;
        }
    }
}
