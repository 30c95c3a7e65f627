//! Genre tags select timbre and pattern variants, nothing else.

use crate::dsp::oscillator::Waveform;

/// Arrangement choices derived from a genre tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenreProfile {
    /// Oscillator shape for the harmony voices.
    pub waveform: Waveform,
    /// Voices alternate between `-detune` and `+detune` cents.
    pub detune_cents: f64,
    /// Hi-hats per beat (1 or 2).
    pub hats_per_beat: usize,
    /// Kick and hi-hat enabled.
    pub percussion: bool,
    /// Reverb return level on the master bus.
    pub reverb_return: f32,
    /// Lowpass sweep bounds, Hz.
    pub sweep_low: f64,
    pub sweep_high: f64,
}

impl Default for GenreProfile {
    fn default() -> Self {
        GenreProfile {
            waveform: Waveform::Triangle,
            detune_cents: 0.0,
            hats_per_beat: 1,
            percussion: true,
            reverb_return: 0.35,
            sweep_low: 600.0,
            sweep_high: 2400.0,
        }
    }
}

const AMBIENT: &[&str] = &["ambient", "drone", "newage", "meditation", "soundscape"];
const SYNTH: &[&str] = &[
    "synth", "edm", "electro", "techno", "house", "trance", "dance", "dubstep", "cyberpunk",
];
const SOFT: &[&str] = &[
    "lofi", "jazz", "acoustic", "folk", "ballad", "soul", "rnb", "classical", "chill",
];
const DENSE: &[&str] = &["trap", "dnb", "drumandbass", "rock", "punk", "metal", "hiphop"];

fn matches(tag: &str, keys: &[&str]) -> bool {
    keys.iter().any(|k| tag.contains(k))
}

/// Profile for a free-form genre tag ("Lo-Fi", "synthwave", ...).
/// Matching ignores case, spaces and punctuation.
pub fn profile_for(genre: &str) -> GenreProfile {
    let tag: String = genre
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();

    let mut profile = GenreProfile::default();
    if matches(&tag, AMBIENT) {
        profile.waveform = Waveform::Sine;
        profile.percussion = false;
        profile.reverb_return = 0.6;
        profile.sweep_low = 400.0;
        profile.sweep_high = 1600.0;
    } else if matches(&tag, SYNTH) {
        profile.waveform = Waveform::Sawtooth;
        profile.detune_cents = 7.0;
        profile.hats_per_beat = 2;
        profile.sweep_low = 800.0;
        profile.sweep_high = 4000.0;
    } else if matches(&tag, SOFT) {
        profile.waveform = Waveform::Sine;
        profile.reverb_return = 0.45;
        profile.sweep_low = 500.0;
        profile.sweep_high = 1800.0;
    }
    if matches(&tag, DENSE) {
        profile.hats_per_beat = 2;
    }
    profile
}
