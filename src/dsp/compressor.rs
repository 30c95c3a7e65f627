//! Compressor effect: dynamics processing for audio leveling.
//!
//! Implements a feed-forward compressor with threshold, ratio, knee,
//! attack, and release parameters matching the WebAudio DynamicsCompressorNode.
//! Detection is linked across channels, so the stereo image never shifts.
//! With a high ratio and a hard knee the same type serves as the limiter.

/// A multi-channel dynamics compressor.
#[derive(Debug, Clone)]
pub struct Compressor {
    sample_rate: f64,

    /// Threshold in dB (typical: -50 to 0).
    pub threshold: f64,
    /// Compression ratio (e.g., 4.0 = 4:1 compression).
    pub ratio: f64,
    /// Knee width in dB (0 = hard knee, higher = softer transition).
    pub knee: f64,
    /// Attack time in seconds.
    pub attack: f64,
    /// Release time in seconds.
    pub release: f64,
    /// Makeup gain in dB.
    pub makeup_gain: f64,

    // Internal state
    envelope: f64, // Current envelope level (linear)
}

impl Compressor {
    /// Create a new compressor with default settings.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            threshold: -24.0,
            ratio: 4.0,
            knee: 6.0,
            attack: 0.003, // 3ms
            release: 0.25, // 250ms
            makeup_gain: 0.0,
            envelope: 0.0,
        }
    }

    /// Create a compressor with specific parameters. Out-of-range values are clamped.
    pub fn with_params(
        sample_rate: f64,
        threshold: f64,
        ratio: f64,
        attack: f64,
        release: f64,
    ) -> Self {
        let mut c = Self::new(sample_rate);
        c.threshold = threshold.clamp(-100.0, 0.0);
        c.ratio = ratio.clamp(1.0, 20.0);
        c.attack = attack.clamp(0.0001, 1.0);
        c.release = release.clamp(0.001, 5.0);
        c
    }

    /// Builder-style knee override (clamped to 0..=40 dB).
    pub fn knee(mut self, knee: f64) -> Self {
        self.knee = knee.clamp(0.0, 40.0);
        self
    }

    /// Convert linear amplitude to dB.
    #[inline]
    pub fn linear_to_db(linear: f64) -> f64 {
        if linear <= 0.0 {
            -120.0
        } else {
            20.0 * linear.log10()
        }
    }

    /// Convert dB to linear amplitude.
    #[inline]
    pub fn db_to_linear(db: f64) -> f64 {
        10.0_f64.powf(db / 20.0)
    }

    /// Gain change in dB for a detector level in dB. The soft knee runs
    /// from the threshold up to `threshold + knee`, as in WebAudio; nothing
    /// below the threshold is touched.
    #[inline]
    fn compute_gain(&self, input_db: f64) -> f64 {
        let over = input_db - self.threshold;
        let slope = 1.0 - 1.0 / self.ratio;
        if over <= 0.0 {
            0.0
        } else if over >= self.knee {
            // Above the knee: full ratio, offset to meet the knee curve.
            -slope * (over - self.knee / 2.0)
        } else {
            // Quadratic: slope 1 at the threshold, 1/ratio at the knee end.
            -slope * over * over / (2.0 * self.knee)
        }
    }

    fn coefficients(&self) -> (f64, f64) {
        let attack_coef = (-1.0 / (self.attack * self.sample_rate)).exp();
        let release_coef = (-1.0 / (self.release * self.sample_rate)).exp();
        (attack_coef, release_coef)
    }

    /// Advance the envelope follower with one detector sample, returning the linear gain.
    #[inline]
    fn step(&mut self, input_level: f64, attack_coef: f64, release_coef: f64) -> f64 {
        if input_level > self.envelope {
            self.envelope = attack_coef * self.envelope + (1.0 - attack_coef) * input_level;
        } else {
            self.envelope = release_coef * self.envelope + (1.0 - release_coef) * input_level;
        }

        let envelope_db = Self::linear_to_db(self.envelope);
        let gain_reduction_db = self.compute_gain(envelope_db);
        Self::db_to_linear(gain_reduction_db + self.makeup_gain)
    }

    /// Process planar audio in place. Every channel gets the same gain.
    pub fn process_block(&mut self, channels: &mut [Vec<f32>]) {
        let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        let (attack_coef, release_coef) = self.coefficients();
        for i in 0..frames {
            let level = channels
                .iter()
                .fold(0.0_f32, |m, ch| m.max(ch[i].abs())) as f64;
            let gain = self.step(level, attack_coef, release_coef) as f32;
            for ch in channels.iter_mut() {
                ch[i] *= gain;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(comp: &mut Compressor, level: f32, frames: usize) -> f32 {
        let mut block = vec![vec![level; frames], vec![level; frames]];
        comp.process_block(&mut block);
        block[0][frames - 1]
    }

    #[test]
    fn test_compressor_passthrough_below_threshold() {
        let mut comp = Compressor::with_params(44100.0, -20.0, 4.0, 0.001, 0.1);

        // -26 dB, below the -20 dB threshold
        let out = run(&mut comp, 0.04, 1000);
        assert!(
            (out - 0.04).abs() < 0.001,
            "Below threshold, output should be close to input: got {out}"
        );
    }

    #[test]
    fn test_compressor_reduces_loud_signals() {
        let mut comp = Compressor::with_params(44100.0, -12.0, 4.0, 0.001, 0.1);

        // 0 dB, 12 dB over with a 6 dB knee: 4:1 removes 6.75 dB, so ~0.46
        let out = run(&mut comp, 1.0, 5000);
        assert!(out < 0.5, "Compressor should reduce loud signals: got {out}");
        assert!(out > 0.1, "Compressor should not over-compress: got {out}");
    }

    #[test]
    fn test_compressor_attack_time() {
        let mut comp = Compressor::with_params(44100.0, -20.0, 10.0, 0.01, 0.5);

        let first = run(&mut comp, 1.0, 1);
        let later = run(&mut comp, 1.0, 500);

        assert!(
            first > later,
            "First sample should be louder than after attack: first={first}, later={later}"
        );
    }

    #[test]
    fn test_compressor_release_time() {
        let mut comp = Compressor::with_params(44100.0, -20.0, 10.0, 0.001, 0.05);

        run(&mut comp, 1.0, 1000);
        let compressed = run(&mut comp, 0.1, 1);
        let released = run(&mut comp, 0.1, 5000);

        assert!(
            released > compressed,
            "After release, gain should recover: compressed={compressed}, released={released}"
        );
    }

    #[test]
    fn linked_detection_keeps_balance() {
        let mut comp = Compressor::with_params(44100.0, -30.0, 8.0, 0.001, 0.1);
        let mut block = vec![vec![0.9_f32; 2000], vec![0.3_f32; 2000]];
        comp.process_block(&mut block);
        let ratio = block[0][1999] / block[1][1999];
        assert!((ratio - 3.0).abs() < 1e-4, "L/R ratio should survive, got {ratio}");
    }

    #[test]
    fn limiter_holds_ceiling() {
        let mut comp = Compressor::with_params(24000.0, -1.0, 20.0, 0.001, 0.1).knee(0.0);
        let out = run(&mut comp, 1.0, 2400);
        // 1 dB over at 20:1 leaves ~-0.95 dBFS
        let out_db = Compressor::linear_to_db(out as f64);
        assert!(out_db < -0.9 && out_db > -1.1, "limited level {out_db} dB");
    }

    #[test]
    fn soft_knee_starts_at_threshold() {
        let comp = Compressor::with_params(24000.0, -20.0, 2.5, 0.03, 0.25).knee(30.0);
        assert_eq!(comp.compute_gain(-25.0), 0.0);
        assert_eq!(comp.compute_gain(-20.0), 0.0);
        // Halfway into the knee: 0.6 * 15^2 / 60
        assert!((comp.compute_gain(-5.0) + 2.25).abs() < 1e-9);
        // Curve and line meet at the knee end
        let edge = comp.compute_gain(10.0);
        assert!((edge + 9.0).abs() < 1e-9, "knee end {edge}");
        assert!((comp.compute_gain(20.0) - edge + 6.0).abs() < 1e-9);
    }

    #[test]
    fn steady_level_under_threshold_is_untouched() {
        let mut comp = Compressor::with_params(24000.0, -20.0, 2.5, 0.03, 0.25).knee(30.0);
        // -25 dBFS
        let level = 0.056_f32;
        let out = run(&mut comp, level, 24000);
        assert_eq!(out, level);
    }

    #[test]
    fn test_makeup_gain() {
        let mut comp = Compressor::new(44100.0);
        comp.threshold = -40.0;
        comp.ratio = 4.0;
        comp.makeup_gain = 6.0;

        let quiet = run(&mut comp, 0.001, 2000);
        assert!(
            (quiet - 0.001 * 2.0).abs() < 1e-4,
            "Below threshold, +6dB makeup should double: got {quiet}"
        );
    }
}
