//! Harmony layer: one oscillator per triad note, an envelope over each
//! chord window and a slow lowpass sweep per voice.

use std::f64::consts::PI;

use super::Timeline;
use super::chords::chord_frequencies;
use super::genre::GenreProfile;
use crate::dsp::envelope::Envelope;
use crate::dsp::filter::{BiquadFilter, FilterType};
use crate::dsp::mixer::Mixer;
use crate::dsp::oscillator::Oscillator;
use crate::dsp::stereo::pan_gains;
use crate::graph::renderer::Interrupt;

/// Frames between lowpass coefficient updates.
const SWEEP_QUANTUM: usize = 128;
const VOICE_LEVEL: f64 = 0.16;
const VOICE_PAN: f32 = 0.6;
const ATTACK_SECONDS: f64 = 0.05;
const RELEASE_SECONDS: f64 = 0.25;

/// Add the chord pads for the whole timeline to `bus`. The progression
/// cycles; an empty one plays the fallback triad throughout.
pub(crate) fn render_harmony<I: Interrupt, S: AsRef<str>>(
    timeline: &Timeline,
    progression: &[S],
    profile: &GenreProfile,
    bus: &mut Mixer,
    interrupt: &I,
) -> Result<(), I::Error> {
    let mut triads: Vec<[f64; 3]> = progression
        .iter()
        .map(|c| chord_frequencies(c.as_ref()))
        .collect();
    if triads.is_empty() {
        triads.push(chord_frequencies(""));
    }

    let rate = timeline.sample_rate;
    let window = timeline.window_seconds();
    let mut envelope: Vec<f64> = Vec::new();

    for w in 0..timeline.window_count() {
        interrupt.check()?;

        let start = timeline.frame_at(w as f64 * window);
        let end = timeline.frame_at((w + 1) as f64 * window).min(timeline.frames);
        if end <= start {
            continue;
        }
        let len = end - start;

        envelope.resize(len, 0.0);
        Envelope::attack_sustain_release(
            VOICE_LEVEL,
            ATTACK_SECONDS,
            RELEASE_SECONDS,
            len as f64 / rate,
        )
        .fill(&mut envelope, 0.0, rate);

        let triad = triads[w % triads.len()];
        for (voice, &freq) in triad.iter().enumerate() {
            let (detune, pan) = if voice % 2 == 0 {
                (-profile.detune_cents, -VOICE_PAN)
            } else {
                (profile.detune_cents, VOICE_PAN)
            };
            let gains = pan_gains(pan);
            let mut osc = Oscillator::with_params(profile.waveform, rate, freq, detune);
            let mut lowpass =
                BiquadFilter::with_params(FilterType::Lowpass, rate, profile.sweep_low, 0.707, 0.0);

            for quantum in (0..len).step_by(SWEEP_QUANTUM) {
                // low at the window edges, high in the middle
                let x = (quantum as f64 + SWEEP_QUANTUM as f64 / 2.0) / len as f64;
                let cutoff = profile.sweep_low
                    + (profile.sweep_high - profile.sweep_low) * (PI * x.min(1.0)).sin();
                lowpass.set_frequency(cutoff);

                for i in quantum..(quantum + SWEEP_QUANTUM).min(len) {
                    let y = lowpass.process(osc.next_sample()) * envelope[i];
                    bus.add(start + i, y as f32, gains);
                }
            }
        }
    }
    Ok(())
}
