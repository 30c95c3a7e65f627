//! Procedural Composer: backing tracks from tempo, chords and a genre tag.
//!
//! Rhythm and harmony are synthesized straight onto a stereo [`Mixer`] bus,
//! then the bus runs through a small master graph (reverb send, master
//! gain) on the signal-graph renderer. Output is always stereo at
//! [`COMPOSER_SAMPLE_RATE`] and exactly `round(seconds · rate)` frames long.

pub mod chords;
pub mod genre;
pub mod reverb;

mod harmony;
mod rhythm;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::buffer::SampleBuffer;
use crate::dsp::mixer::Mixer;
use crate::error::Cancelled;
use crate::graph::renderer::{Interrupt, Uninterrupted};
use crate::graph::{CancelToken, EffectNode, RenderGraph, Renderer};

pub use chords::chord_frequencies;
pub use genre::{GenreProfile, profile_for};

/// Rate of every composed buffer; matches the synthesized vocal stems.
pub const COMPOSER_SAMPLE_RATE: u32 = 24_000;
pub const MIN_BPM: f64 = 60.0;
pub const MAX_BPM: f64 = 220.0;
/// Longest arrangement accepted, seconds.
pub const MAX_DURATION_SECONDS: f64 = 3600.0;

const REVERB_SEND: f32 = 0.35;
const MASTER_GAIN: f32 = 0.55;
/// Share of the progress range spent on synthesis before the master bus.
const SYNTHESIS_PROGRESS: f32 = 60.0;

/// Everything that shapes one composed track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComposeRequest {
    pub bpm: f64,
    pub chord_progression: Vec<String>,
    pub genre: String,
    pub duration_seconds: f64,
    /// Beats per chord change; one 4/4 bar by default.
    pub beats_per_chord: u32,
    pub reverb_seconds: f64,
    pub reverb_decay: f64,
    /// Seeds the hi-hat noise and the reverb response.
    pub seed: u64,
}

impl Default for ComposeRequest {
    fn default() -> Self {
        ComposeRequest {
            bpm: 120.0,
            chord_progression: ["C", "Am", "F", "G"].map(String::from).to_vec(),
            genre: String::new(),
            duration_seconds: 30.0,
            beats_per_chord: 4,
            reverb_seconds: 2.0,
            reverb_decay: 2.0,
            seed: 0x5EED,
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

impl ComposeRequest {
    pub fn new<S: AsRef<str>>(bpm: f64, chords: &[S], genre: &str, seconds: f64) -> Self {
        ComposeRequest {
            bpm,
            chord_progression: chords.iter().map(|c| c.as_ref().to_owned()).collect(),
            genre: genre.to_owned(),
            duration_seconds: seconds,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// A copy with every numeric field clamped into range. Non-finite
    /// durations compose nothing.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        ComposeRequest {
            bpm: finite_or(self.bpm, defaults.bpm).clamp(MIN_BPM, MAX_BPM),
            chord_progression: self.chord_progression.clone(),
            genre: self.genre.clone(),
            duration_seconds: finite_or(self.duration_seconds, 0.0)
                .clamp(0.0, MAX_DURATION_SECONDS),
            beats_per_chord: self.beats_per_chord.clamp(1, 32),
            reverb_seconds: finite_or(self.reverb_seconds, defaults.reverb_seconds)
                .clamp(0.1, 10.0),
            reverb_decay: finite_or(self.reverb_decay, defaults.reverb_decay).clamp(0.1, 20.0),
            seed: self.seed,
        }
    }

    /// Output length in frames.
    pub fn frames(&self) -> usize {
        let cfg = self.sanitized();
        (cfg.duration_seconds * COMPOSER_SAMPLE_RATE as f64).round() as usize
    }
}

/// Beat and chord-window grid shared by the synthesis layers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Timeline {
    pub sample_rate: f64,
    pub frames: usize,
    pub seconds_per_beat: f64,
    pub beats_per_chord: usize,
}

impl Timeline {
    pub fn new(sample_rate: u32, frames: usize, bpm: f64, beats_per_chord: usize) -> Self {
        Timeline {
            sample_rate: sample_rate as f64,
            frames,
            seconds_per_beat: 60.0 / bpm,
            beats_per_chord: beats_per_chord.max(1),
        }
    }

    pub fn frame_at(&self, seconds: f64) -> usize {
        (seconds * self.sample_rate).round() as usize
    }

    pub fn window_seconds(&self) -> f64 {
        self.seconds_per_beat * self.beats_per_chord as f64
    }

    fn count(&self, period_seconds: f64) -> usize {
        (self.frames as f64 / (period_seconds * self.sample_rate)).ceil() as usize
    }

    pub fn beat_count(&self) -> usize {
        self.count(self.seconds_per_beat)
    }

    pub fn window_count(&self) -> usize {
        self.count(self.window_seconds())
    }
}

/// Reverb send and master gain.
fn master_graph(request: &ComposeRequest, profile: &GenreProfile) -> RenderGraph {
    let impulse = reverb::impulse_response(
        request.reverb_seconds,
        request.reverb_decay,
        COMPOSER_SAMPLE_RATE,
        request.seed.wrapping_add(1),
    );
    RenderGraph::new()
        .then(EffectNode::Branch {
            dry: 1.0,
            wet: profile.reverb_return,
            nodes: vec![
                EffectNode::Gain { gain: REVERB_SEND },
                EffectNode::Convolution {
                    impulse: Arc::new(impulse),
                    normalize: true,
                },
            ],
        })
        .then(EffectNode::Gain { gain: MASTER_GAIN })
}

fn compose_with<I: Interrupt>(
    request: &ComposeRequest,
    progress: Option<&mut dyn FnMut(f32)>,
    interrupt: &I,
) -> Result<SampleBuffer, I::Error> {
    let request = request.sanitized();
    let profile = profile_for(&request.genre);
    let frames = request.frames();

    let mut progress = progress;
    let mut report = |percent: f32| {
        if let Some(callback) = progress.as_deref_mut() {
            callback(percent);
        }
    };

    info!(
        bpm = request.bpm,
        chords = request.chord_progression.len(),
        genre = %request.genre,
        seconds = request.duration_seconds,
        "composing backing track"
    );
    debug!(?profile, "genre profile");

    report(0.0);
    interrupt.check()?;
    if frames == 0 {
        report(100.0);
        return Ok(SampleBuffer::silent(2, 0, COMPOSER_SAMPLE_RATE));
    }

    let timeline = Timeline::new(
        COMPOSER_SAMPLE_RATE,
        frames,
        request.bpm,
        request.beats_per_chord as usize,
    );
    let mut bus = Mixer::new(frames);

    rhythm::render_rhythm(&timeline, &profile, request.seed, &mut bus, interrupt)?;
    report(SYNTHESIS_PROGRESS / 2.0);
    harmony::render_harmony(
        &timeline,
        &request.chord_progression,
        &profile,
        &mut bus,
        interrupt,
    )?;
    report(SYNTHESIS_PROGRESS);

    let dry = bus.into_buffer(COMPOSER_SAMPLE_RATE);
    let graph = master_graph(&request, &profile);
    let mut master_progress =
        |p: f32| report(SYNTHESIS_PROGRESS + (100.0 - SYNTHESIS_PROGRESS) * p / 100.0);
    Renderer::with_progress(&mut master_progress).run(&graph, &dry, interrupt)
}

/// Compose with the full request surface.
pub fn compose(request: &ComposeRequest) -> SampleBuffer {
    let Ok(track) = compose_with(request, None, &Uninterrupted);
    track
}

/// [`compose`] with progress reporting and cancellation between stages.
pub fn compose_cancellable(
    request: &ComposeRequest,
    progress: Option<&mut dyn FnMut(f32)>,
    token: &CancelToken,
) -> Result<SampleBuffer, Cancelled> {
    compose_with(request, progress, token)
}

/// Stereo 24 kHz backing track of `seconds` length. `bpm` is clamped to
/// 60..=220; chords cycle one per bar.
pub fn compose_backing<S: AsRef<str>>(
    bpm: f64,
    chords: &[S],
    genre: &str,
    seconds: f64,
) -> SampleBuffer {
    compose(&ComposeRequest::new(bpm, chords, genre, seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOFI: [&str; 4] = ["C", "Am", "F", "G"];

    #[test]
    fn duration_is_exact() {
        for seconds in [1.0, 30.0, 180.0] {
            for bpm in [60.0, 120.0, 220.0] {
                let track = compose_backing(bpm, &LOFI, "Lo-Fi", seconds);
                assert_eq!(
                    track.len(),
                    (seconds * 24000.0) as usize,
                    "{seconds} s at {bpm} bpm"
                );
                assert_eq!(track.channel_count(), 2);
                assert_eq!(track.sample_rate(), COMPOSER_SAMPLE_RATE);
            }
        }
    }

    #[test]
    fn lofi_has_energy_throughout() {
        let track = compose_backing(120.0, &LOFI, "Lo-Fi", 8.0);
        assert_eq!(track.len(), 8 * 24000);
        let segment = 6000; // 0.25 s
        for (i, start) in (0..track.len()).step_by(segment).enumerate() {
            for ch in 0..2 {
                let seg = &track.channel(ch)[start..start + segment];
                let rms = (seg.iter().map(|s| s * s).sum::<f32>() / segment as f32).sqrt();
                assert!(rms > 1e-3, "segment {i} channel {ch} is silent (rms {rms})");
            }
        }
        assert!(track.channel(0).iter().all(|s| s.is_finite()));
    }

    #[test]
    fn ambient_still_has_pads() {
        let track = compose_backing(80.0, &["Dm", "G"], "ambient", 4.0);
        assert!(track.rms() > 0.01, "rms {}", track.rms());
    }

    #[test]
    fn deterministic_for_same_request() {
        let a = compose_backing(100.0, &["Em", "C"], "synthwave", 3.0);
        let b = compose_backing(100.0, &["Em", "C"], "synthwave", 3.0);
        assert_eq!(a, b);

        let other_seed = compose(&ComposeRequest {
            seed: 99,
            ..ComposeRequest::new(100.0, &["Em", "C"], "synthwave", 3.0)
        });
        assert_ne!(a, other_seed);
    }

    #[test]
    fn degenerate_durations_are_empty() {
        for seconds in [0.0, -5.0, f64::NAN] {
            let track = compose_backing(120.0, &LOFI, "pop", seconds);
            assert!(track.is_empty());
            assert_eq!(track.channel_count(), 2);
        }
    }

    #[test]
    fn odd_inputs_still_compose() {
        let none: [&str; 0] = [];
        let track = compose_backing(5000.0, &none, "", 1.5);
        assert_eq!(track.len(), 36000);
        assert!(track.rms() > 0.0);
    }

    #[test]
    fn request_sanitizes() {
        let req = ComposeRequest {
            bpm: 10.0,
            beats_per_chord: 0,
            reverb_seconds: f64::NAN,
            duration_seconds: 1e9,
            ..ComposeRequest::default()
        }
        .sanitized();
        assert_eq!(req.bpm, MIN_BPM);
        assert_eq!(req.beats_per_chord, 1);
        assert_eq!(req.reverb_seconds, 2.0);
        assert_eq!(req.duration_seconds, MAX_DURATION_SECONDS);
    }

    #[test]
    fn request_json_is_camel_case() {
        let req = ComposeRequest::from_json(
            r#"{"bpm": 90, "chordProgression": ["Am", "F"], "genre": "Lo-Fi", "durationSeconds": 12, "beatsPerChord": 2}"#,
        )
        .unwrap();
        assert_eq!(req.bpm, 90.0);
        assert_eq!(req.chord_progression, vec!["Am", "F"]);
        assert_eq!(req.duration_seconds, 12.0);
        assert_eq!(req.beats_per_chord, 2);
        assert_eq!(req.reverb_decay, 2.0);
        assert_eq!(req.frames(), 12 * 24000);
    }

    #[test]
    fn progress_and_cancellation() {
        let req = ComposeRequest::new(120.0, &LOFI, "lofi", 2.0);
        let mut seen = Vec::new();
        let mut record = |p: f32| seen.push(p);
        let token = CancelToken::new();
        compose_cancellable(&req, Some(&mut record), &token).unwrap();
        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&100.0));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");

        token.cancel();
        assert_eq!(compose_cancellable(&req, None, &token), Err(Cancelled));
    }

    #[test]
    fn timeline_grid() {
        let tl = Timeline::new(24000, 24000 * 5, 120.0, 4);
        assert_eq!(tl.beat_count(), 10);
        assert_eq!(tl.window_count(), 3);
        assert_eq!(tl.frame_at(0.5), 12000);
    }
}
