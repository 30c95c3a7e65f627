//! Automation envelope: a breakpoint timeline in the style of a WebAudio
//! `AudioParam`: step, linear and exponential segments, evaluated offline.

/// How the value travels from the previous breakpoint to this one.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Ramp {
    Step,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy)]
struct Breakpoint {
    time: f64,
    value: f64,
    ramp: Ramp,
}

/// Smallest magnitude an exponential ramp may target.
pub const MIN_EXP_VALUE: f64 = 1e-4;

/// A parameter timeline. Times are seconds relative to the envelope start
/// and must be added in non-decreasing order; earlier times are raised to
/// the last breakpoint's time.
#[derive(Debug, Clone)]
pub struct Envelope {
    initial: f64,
    points: Vec<Breakpoint>,
}

impl Envelope {
    pub fn new(initial: f64) -> Self {
        Envelope {
            initial,
            points: Vec::new(),
        }
    }

    /// Attack / sustain / release over a window of `length` seconds: rises
    /// linearly from zero to `peak`, holds, then falls linearly to zero at
    /// `length`.
    pub fn attack_sustain_release(peak: f64, attack: f64, release: f64, length: f64) -> Self {
        let length = length.max(0.0);
        let attack = attack.clamp(0.0, length / 2.0);
        let release = release.clamp(0.0, length - attack);
        Envelope::new(0.0)
            .linear_ramp_to(peak, attack)
            .set_value_at(peak, length - release)
            .linear_ramp_to(0.0, length)
    }

    fn push(mut self, value: f64, time: f64, ramp: Ramp) -> Self {
        let floor = self.points.last().map_or(0.0, |p| p.time);
        let time = if time.is_finite() { time.max(floor) } else { floor };
        self.points.push(Breakpoint { time, value, ramp });
        self
    }

    /// Jump to `value` at `time`.
    pub fn set_value_at(self, value: f64, time: f64) -> Self {
        self.push(value, time, Ramp::Step)
    }

    /// Ramp linearly from the previous breakpoint to `value` at `time`.
    pub fn linear_ramp_to(self, value: f64, time: f64) -> Self {
        self.push(value, time, Ramp::Linear)
    }

    /// Ramp exponentially to `value` at `time`. Targets nearer zero than
    /// [`MIN_EXP_VALUE`] are pulled out to it.
    pub fn exponential_ramp_to(self, value: f64, time: f64) -> Self {
        let value = if value.abs() < MIN_EXP_VALUE {
            MIN_EXP_VALUE.copysign(value)
        } else {
            value
        };
        self.push(value, time, Ramp::Exponential)
    }

    /// Time of the final breakpoint.
    pub fn end_time(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.time)
    }

    /// Value of the segment ending at `points[idx]`, at time `t`.
    fn segment_value(&self, idx: usize, t: f64) -> f64 {
        let (t0, v0) = match idx {
            0 => (0.0, self.initial),
            _ => (self.points[idx - 1].time, self.points[idx - 1].value),
        };
        let end = self.points[idx];
        let span = end.time - t0;
        if span <= 0.0 {
            return end.value;
        }
        let x = ((t - t0) / span).clamp(0.0, 1.0);
        match end.ramp {
            Ramp::Step => v0,
            Ramp::Linear => v0 + (end.value - v0) * x,
            Ramp::Exponential => {
                if v0 == 0.0 || v0.signum() != end.value.signum() {
                    v0
                } else {
                    v0 * (end.value / v0).powf(x)
                }
            }
        }
    }

    /// Value at time `t` seconds.
    pub fn value_at(&self, t: f64) -> f64 {
        let idx = self.points.partition_point(|p| p.time <= t);
        if idx == self.points.len() {
            return self.points.last().map_or(self.initial, |p| p.value);
        }
        self.segment_value(idx, t)
    }

    /// Fill `out` with the envelope sampled from `start` seconds at `sample_rate`.
    pub fn fill(&self, out: &mut [f64], start: f64, sample_rate: f64) {
        let mut idx = self.points.partition_point(|p| p.time <= start);
        for (i, slot) in out.iter_mut().enumerate() {
            let t = start + i as f64 / sample_rate;
            while idx < self.points.len() && self.points[idx].time <= t {
                idx += 1;
            }
            *slot = if idx == self.points.len() {
                self.points.last().map_or(self.initial, |p| p.value)
            } else {
                self.segment_value(idx, t)
            };
        }
    }

    /// `frames` samples from time zero.
    pub fn render(&self, frames: usize, sample_rate: f64) -> Vec<f64> {
        let mut out = vec![0.0; frames];
        self.fill(&mut out, 0.0, sample_rate);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_initial_without_points() {
        let env = Envelope::new(0.3);
        assert_eq!(env.value_at(0.0), 0.3);
        assert_eq!(env.value_at(10.0), 0.3);
    }

    #[test]
    fn linear_ramp_midpoint() {
        let env = Envelope::new(0.0).linear_ramp_to(1.0, 2.0);
        assert!((env.value_at(1.0) - 0.5).abs() < 1e-12);
        assert_eq!(env.value_at(5.0), 1.0);
    }

    #[test]
    fn exponential_ramp_is_geometric() {
        let env = Envelope::new(150.0).exponential_ramp_to(0.01, 0.5);
        let mid = env.value_at(0.25);
        let expected = (150.0_f64 * 0.01).sqrt();
        assert!((mid - expected).abs() < 1e-9, "geometric midpoint {expected}, got {mid}");
        assert!((env.value_at(0.5) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn exponential_to_zero_is_floored() {
        let env = Envelope::new(1.0).exponential_ramp_to(0.0, 1.0);
        assert!((env.value_at(1.0) - MIN_EXP_VALUE).abs() < 1e-15);
        assert!(env.value_at(0.5) > 0.0);
    }

    #[test]
    fn step_jumps_at_time() {
        let env = Envelope::new(0.0).set_value_at(1.0, 0.5);
        assert_eq!(env.value_at(0.49), 0.0);
        assert_eq!(env.value_at(0.5), 1.0);
    }

    #[test]
    fn out_of_order_times_are_raised() {
        let env = Envelope::new(0.0).linear_ramp_to(1.0, 1.0).linear_ramp_to(0.0, 0.5);
        assert_eq!(env.end_time(), 1.0);
    }

    #[test]
    fn asr_shape() {
        let env = Envelope::attack_sustain_release(0.2, 0.1, 0.4, 2.0);
        let samples = env.render(2001, 1000.0);
        assert_eq!(samples[0], 0.0);
        assert!((samples[50] - 0.1).abs() < 1e-9, "half-way through attack");
        assert!((samples[1000] - 0.2).abs() < 1e-12, "sustain");
        assert!((samples[1800] - 0.1).abs() < 1e-9, "half-way through release");
        assert!(samples[2000].abs() < 1e-12, "ends at zero");
        assert!(samples.iter().all(|&s| (0.0..=0.2 + 1e-12).contains(&s)));
    }

    #[test]
    fn fill_matches_value_at() {
        let env = Envelope::new(0.5)
            .linear_ramp_to(1.0, 0.01)
            .exponential_ramp_to(0.05, 0.2)
            .set_value_at(0.3, 0.25);
        let mut out = vec![0.0; 300];
        env.fill(&mut out, 0.0, 1000.0);
        for (i, &v) in out.iter().enumerate() {
            let t = i as f64 / 1000.0;
            assert!((v - env.value_at(t)).abs() < 1e-12, "mismatch at {t}");
        }
    }
}
