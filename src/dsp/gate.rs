//! Noise gate: mutes passages whose level stays under a threshold.
//!
//! Uses the same one-pole envelope follower as the compressor; the gate
//! gain itself is smoothed with the attack/release times so it never clicks.

use super::compressor::Compressor;

#[derive(Debug, Clone)]
pub struct NoiseGate {
    sample_rate: f64,
    /// Open threshold in dB.
    pub threshold: f64,
    /// Opening time in seconds.
    pub attack: f64,
    /// Closing time in seconds.
    pub release: f64,
    envelope: f64,
    gain: f64,
}

impl NoiseGate {
    pub fn new(sample_rate: f64, threshold: f64, attack: f64, release: f64) -> Self {
        NoiseGate {
            sample_rate,
            threshold: threshold.clamp(-120.0, 0.0),
            attack: attack.clamp(0.0001, 1.0),
            release: release.clamp(0.001, 5.0),
            envelope: 0.0,
            gain: 0.0,
        }
    }

    /// Gate planar audio in place; detection is linked across channels.
    pub fn process_block(&mut self, channels: &mut [Vec<f32>]) {
        let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        let attack_coef = (-1.0 / (self.attack * self.sample_rate)).exp();
        let release_coef = (-1.0 / (self.release * self.sample_rate)).exp();
        let open_level = Compressor::db_to_linear(self.threshold);

        for i in 0..frames {
            let level = channels
                .iter()
                .fold(0.0_f32, |m, ch| m.max(ch[i].abs())) as f64;
            let coef = if level > self.envelope { attack_coef } else { release_coef };
            self.envelope = coef * self.envelope + (1.0 - coef) * level;

            let target = if self.envelope >= open_level { 1.0 } else { 0.0 };
            let coef = if target > self.gain { attack_coef } else { release_coef };
            self.gain = coef * self.gain + (1.0 - coef) * target;

            let g = self.gain as f32;
            for ch in channels.iter_mut() {
                ch[i] *= g;
            }
        }
    }
}
