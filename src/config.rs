//! Remaster parameters as they arrive from callers.
//!
//! Values are never rejected: `sanitized()` clamps every field into its
//! documented range and replaces NaN with the field default.

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MAX_EQ_GAIN_DB: f64 = 24.0;
/// Width that leaves the stereo image untouched.
pub const NEUTRAL_WIDTH: f64 = 0.5;

/// Tone, dynamics and space settings for one remaster request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    /// Low shelf gain at 200 Hz, dB.
    pub low_gain: f64,
    /// Peaking gain at 1.8 kHz, dB.
    pub mid_gain: f64,
    /// High shelf gain at 8 kHz, dB.
    pub high_gain: f64,
    /// Enable the soft-clip waveshaper.
    pub saturation: bool,
    /// Dry/wet fraction, 0 = untouched input, 1 = fully processed.
    pub mix: f64,
    /// Stereo width, 0 = mono, 0.5 = unchanged, 1 = wide.
    pub width: f64,
    /// Gate out passages below -50 dBFS.
    pub noise_gate: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            low_gain: 0.0,
            mid_gain: 0.0,
            high_gain: 0.0,
            saturation: false,
            mix: 1.0,
            width: NEUTRAL_WIDTH,
            noise_gate: false,
        }
    }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

impl FilterConfig {
    /// EQ-only settings with everything else at defaults.
    pub fn with_eq(low_gain: f64, mid_gain: f64, high_gain: f64) -> Self {
        Self {
            low_gain,
            mid_gain,
            high_gain,
            ..Self::default()
        }
    }

    /// Parse camelCase JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// A copy with every field inside its documented range.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let clean = Self {
            low_gain: clamp_or(self.low_gain, -MAX_EQ_GAIN_DB, MAX_EQ_GAIN_DB, defaults.low_gain),
            mid_gain: clamp_or(self.mid_gain, -MAX_EQ_GAIN_DB, MAX_EQ_GAIN_DB, defaults.mid_gain),
            high_gain: clamp_or(
                self.high_gain,
                -MAX_EQ_GAIN_DB,
                MAX_EQ_GAIN_DB,
                defaults.high_gain,
            ),
            saturation: self.saturation,
            mix: clamp_or(self.mix, 0.0, 1.0, defaults.mix),
            width: clamp_or(self.width, 0.0, 1.0, defaults.width),
            noise_gate: self.noise_gate,
        };
        if clean != *self {
            debug!(original = ?self, clamped = ?clean, "filter config clamped");
        }
        clean
    }

    /// Output gain after the saturation stage: unity, backed off towards
    /// 0.7 as a heavy low boost (+6..+24 dB) meets a fully wet mix.
    pub fn makeup_gain(&self) -> f64 {
        let cfg = self.sanitized();
        if cfg.mix >= 0.95 && cfg.low_gain > 6.0 {
            1.0 - 0.3 * (cfg.low_gain - 6.0) / (MAX_EQ_GAIN_DB - 6.0)
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_uses_camel_case_and_defaults() {
        let cfg =
            FilterConfig::from_json(r#"{"lowGain": -2, "midGain": 3, "highGain": 5}"#).unwrap();
        assert_eq!(cfg.low_gain, -2.0);
        assert_eq!(cfg.mid_gain, 3.0);
        assert_eq!(cfg.high_gain, 5.0);
        assert!(!cfg.saturation);
        assert_eq!(cfg.mix, 1.0);
        assert_eq!(cfg.width, NEUTRAL_WIDTH);

        let json = serde_json::to_string(&FilterConfig {
            noise_gate: true,
            ..FilterConfig::default()
        })
        .unwrap();
        assert!(json.contains("\"noiseGate\":true"), "{json}");
    }

    #[test]
    fn sanitize_clamps_and_replaces_nan() {
        let cfg = FilterConfig {
            low_gain: 80.0,
            mid_gain: f64::NAN,
            high_gain: -100.0,
            saturation: true,
            mix: 3.0,
            width: -1.0,
            noise_gate: true,
        }
        .sanitized();
        assert_eq!(cfg.low_gain, 24.0);
        assert_eq!(cfg.mid_gain, 0.0);
        assert_eq!(cfg.high_gain, -24.0);
        assert_eq!(cfg.mix, 1.0);
        assert_eq!(cfg.width, 0.0);
        assert!(cfg.saturation && cfg.noise_gate);
    }

    #[test]
    fn makeup_gain_backs_off_for_heavy_bass() {
        assert_eq!(FilterConfig::default().makeup_gain(), 1.0);
        assert_eq!(FilterConfig::with_eq(6.0, 0.0, 0.0).makeup_gain(), 1.0);
        let heavy = FilterConfig::with_eq(24.0, 0.0, 0.0);
        assert!((heavy.makeup_gain() - 0.7).abs() < 1e-12);
        let half_wet = FilterConfig {
            mix: 0.5,
            ..heavy
        };
        assert_eq!(half_wet.makeup_gain(), 1.0);
    }
}
