//! The canonical remaster chain: gate, tone EQ, glue compression,
//! saturation, width and a final limiter.

use std::sync::Arc;

use tracing::info;

use super::{CancelToken, EffectNode, RenderGraph, Renderer};
use crate::buffer::SampleBuffer;
use crate::config::{FilterConfig, NEUTRAL_WIDTH};
use crate::dsp::filter::FilterType;
use crate::dsp::waveshaper::{CURVE_POINTS, soft_clip_curve};
use crate::error::Cancelled;

const GATE_THRESHOLD_DB: f64 = -50.0;
const SATURATION_DRIVE: f64 = 100.0;
const SATURATION_OVERSAMPLE: usize = 4;

const LOW_SHELF_HZ: f64 = 200.0;
const MID_PEAK_HZ: f64 = 1800.0;
const HIGH_SHELF_HZ: f64 = 8000.0;

/// Build the remaster graph for `config` (sanitized first).
pub fn remaster_graph(config: &FilterConfig) -> RenderGraph {
    let cfg = config.sanitized();
    let mut graph = RenderGraph::new();

    if cfg.noise_gate {
        graph.push(EffectNode::NoiseGate {
            threshold: GATE_THRESHOLD_DB,
            attack: 0.001,
            release: 0.1,
        });
    }

    let mut wet = vec![
        EffectNode::biquad(FilterType::Highpass, 30.0, 0.707, 0.0),
        EffectNode::biquad(FilterType::LowShelf, LOW_SHELF_HZ, 0.707, cfg.low_gain),
        EffectNode::biquad(FilterType::Peaking, MID_PEAK_HZ, 0.8, cfg.mid_gain),
        EffectNode::biquad(FilterType::HighShelf, HIGH_SHELF_HZ, 0.707, cfg.high_gain),
        EffectNode::compressor(-20.0, 30.0, 2.5, 0.03, 0.25),
    ];
    if cfg.saturation {
        wet.push(EffectNode::WaveShaper {
            curve: Arc::from(soft_clip_curve(SATURATION_DRIVE, CURVE_POINTS)),
            oversample: SATURATION_OVERSAMPLE,
        });
    }
    wet.push(EffectNode::Gain {
        gain: cfg.makeup_gain() as f32,
    });

    graph.push(EffectNode::Branch {
        dry: (1.0 - cfg.mix) as f32,
        wet: cfg.mix as f32,
        nodes: wet,
    });

    if cfg.width != NEUTRAL_WIDTH {
        graph.push(EffectNode::StereoWidth {
            width: cfg.width as f32,
        });
    }

    graph.then(EffectNode::compressor(-1.0, 0.0, 20.0, 0.001, 0.1))
}

/// Run `input` through the remaster chain. Output length, channel count and
/// sample rate match the input.
pub fn remaster(
    input: &SampleBuffer,
    config: &FilterConfig,
    progress: Option<&mut dyn FnMut(f32)>,
) -> SampleBuffer {
    let graph = remaster_graph(config);
    info!(
        frames = input.len(),
        sample_rate = input.sample_rate(),
        stages = graph.stage_count(),
        "remaster"
    );
    renderer(progress).render(&graph, input)
}

/// [`remaster`] that gives up between stages once `token` is cancelled.
pub fn remaster_cancellable(
    input: &SampleBuffer,
    config: &FilterConfig,
    progress: Option<&mut dyn FnMut(f32)>,
    token: &CancelToken,
) -> Result<SampleBuffer, Cancelled> {
    let graph = remaster_graph(config);
    info!(
        frames = input.len(),
        sample_rate = input.sample_rate(),
        stages = graph.stage_count(),
        "remaster (cancellable)"
    );
    renderer(progress).render_cancellable(&graph, input, token)
}

fn renderer<'p>(progress: Option<&'p mut dyn FnMut(f32)>) -> Renderer<'p> {
    match progress {
        Some(callback) => Renderer::with_progress(callback),
        None => Renderer::new(),
    }
}
