//! Mixdown Bus: vocal over backing, summed to one stereo buffer.

use tracing::info;

use crate::buffer::{SampleBuffer, resample_linear};
use crate::dsp::mixer::Mixer;
use crate::error::Cancelled;
use crate::graph::renderer::{Interrupt, Uninterrupted};
use crate::graph::{CancelToken, EffectNode, RenderGraph, Renderer};

pub const VOCAL_GAIN: f32 = 1.1;
pub const BACKING_GAIN: f32 = 0.82;

/// Vocal leveling ahead of the sum.
fn vocal_chain() -> RenderGraph {
    RenderGraph::new()
        .then(EffectNode::compressor(-18.0, 6.0, 4.0, 0.003, 0.25))
        .then(EffectNode::Gain { gain: VOCAL_GAIN })
}

fn mixdown_with<I: Interrupt>(
    vocal: &SampleBuffer,
    backing: &SampleBuffer,
    progress: Option<&mut dyn FnMut(f32)>,
    interrupt: &I,
) -> Result<SampleBuffer, I::Error> {
    let rate = if backing.is_empty() {
        vocal.sample_rate()
    } else {
        backing.sample_rate()
    };
    let vocal = resample_linear(vocal, rate);
    let frames = vocal.len().max(backing.len());
    info!(
        vocal_frames = vocal.len(),
        backing_frames = backing.len(),
        sample_rate = rate,
        "mixdown"
    );

    let mut renderer = match progress {
        Some(callback) => Renderer::with_progress(callback),
        None => Renderer::new(),
    };
    let leveled = renderer.run(&vocal_chain(), &vocal, interrupt)?;

    let mut bus = Mixer::new(frames);
    bus.add_buffer(&leveled, 1.0);
    bus.add_buffer(backing, BACKING_GAIN);
    Ok(bus.into_buffer(rate))
}

/// Sum `vocal` (compressed, ×1.1) and `backing` (×0.82) into a stereo
/// buffer as long as the longer input, at the backing's sample rate. Mono
/// sources feed both sides. No limiting is applied.
pub fn mixdown(vocal: &SampleBuffer, backing: &SampleBuffer) -> SampleBuffer {
    let Ok(mixed) = mixdown_with(vocal, backing, None, &Uninterrupted);
    mixed
}

/// [`mixdown`] with progress over the vocal chain and cancellation.
pub fn mixdown_cancellable(
    vocal: &SampleBuffer,
    backing: &SampleBuffer,
    progress: Option<&mut dyn FnMut(f32)>,
    token: &CancelToken,
) -> Result<SampleBuffer, Cancelled> {
    mixdown_with(vocal, backing, progress, token)
}
