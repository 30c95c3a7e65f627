//! Rhythm layer: a swept-sine kick on every beat and noise hi-hats.

use super::Timeline;
use super::genre::GenreProfile;
use crate::dsp::envelope::Envelope;
use crate::dsp::filter::{BiquadFilter, FilterType};
use crate::dsp::mixer::Mixer;
use crate::dsp::noise::WhiteNoise;
use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::graph::renderer::Interrupt;

const KICK_START_HZ: f64 = 150.0;
const KICK_END_HZ: f64 = 0.01;
const KICK_SECONDS: f64 = 0.5;
const KICK_LEVEL: f32 = 0.8;

const HAT_CUTOFF_HZ: f64 = 7000.0;
const HAT_GAIN: f64 = 0.3;
const HAT_SECONDS: f64 = 0.05;

/// One kick hit: frequency and gain both fall exponentially.
fn kick_one_shot(sample_rate: f64) -> Vec<f32> {
    let frames = (KICK_SECONDS * sample_rate).round() as usize;
    let pitch = Envelope::new(KICK_START_HZ)
        .exponential_ramp_to(KICK_END_HZ, KICK_SECONDS)
        .render(frames, sample_rate);
    let gain = Envelope::new(1.0)
        .exponential_ramp_to(0.01, KICK_SECONDS)
        .render(frames, sample_rate);

    let mut osc = Oscillator::with_params(Waveform::Sine, sample_rate, KICK_START_HZ, 0.0);
    pitch
        .iter()
        .zip(&gain)
        .map(|(&freq, &g)| {
            osc.frequency = freq;
            (osc.next_sample() * g) as f32 * KICK_LEVEL
        })
        .collect()
}

/// Add kicks and hats for the whole timeline to `bus`.
pub(crate) fn render_rhythm<I: Interrupt>(
    timeline: &Timeline,
    profile: &GenreProfile,
    seed: u64,
    bus: &mut Mixer,
    interrupt: &I,
) -> Result<(), I::Error> {
    if !profile.percussion {
        return Ok(());
    }

    let rate = timeline.sample_rate;
    let kick = kick_one_shot(rate);
    let hat_frames = (HAT_SECONDS * rate).round() as usize;
    let hat_gain = Envelope::new(HAT_GAIN)
        .linear_ramp_to(0.0, HAT_SECONDS)
        .render(hat_frames, rate);
    let mut noise = WhiteNoise::new(seed);
    let mut hat = vec![0.0_f32; hat_frames];
    let subdivisions = profile.hats_per_beat.max(1);

    for beat in 0..timeline.beat_count() {
        interrupt.check()?;

        let start = timeline.frame_at(beat as f64 * timeline.seconds_per_beat);
        for (i, &s) in kick.iter().enumerate() {
            bus.add_centered(start + i, s);
        }

        for step in 0..subdivisions {
            let offset = step as f64 / subdivisions as f64;
            let start = timeline.frame_at((beat as f64 + offset) * timeline.seconds_per_beat);
            noise.fill(&mut hat);
            let mut highpass =
                BiquadFilter::with_params(FilterType::Highpass, rate, HAT_CUTOFF_HZ, 0.707, 0.0);
            for (i, (&s, &g)) in hat.iter().zip(&hat_gain).enumerate() {
                let y = highpass.process(s as f64) * g;
                bus.add_centered(start + i, y as f32);
            }
        }
    }
    Ok(())
}
