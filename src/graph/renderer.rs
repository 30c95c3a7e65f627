//! Graph renderer: runs a [`RenderGraph`] over one buffer.
//!
//! Rendering is synchronous and whole-buffer: each node processes every
//! channel end to end before the next node starts. Nodes carry no state
//! between calls; DSP objects are instantiated per render from the node
//! parameters and the [`RenderContext`] of the input.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace};

use super::{EffectNode, RenderContext, RenderGraph};
use crate::buffer::SampleBuffer;
use crate::dsp::compressor::Compressor;
use crate::dsp::convolver::Convolver;
use crate::dsp::filter::BiquadFilter;
use crate::dsp::gate::NoiseGate;
use crate::dsp::stereo::{apply_width, pan_stereo};
use crate::dsp::waveshaper::WaveShaper;
use crate::error::Cancelled;

/// Shared cancellation flag. Clones observe the same flag; a render checks
/// it between nodes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Checked between stages of a render.
pub(crate) trait Interrupt {
    type Error;
    fn check(&self) -> Result<(), Self::Error>;
}

/// Never interrupts.
pub(crate) struct Uninterrupted;

impl Interrupt for Uninterrupted {
    type Error = Infallible;

    fn check(&self) -> Result<(), Infallible> {
        Ok(())
    }
}

impl Interrupt for CancelToken {
    type Error = Cancelled;

    fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Progress bookkeeping for one render call.
struct Checkpoints<'a, 'p> {
    done: usize,
    total: usize,
    sink: Option<&'a mut (dyn FnMut(f32) + 'p)>,
}

impl Checkpoints<'_, '_> {
    fn report(&mut self, percent: f32) {
        trace!(percent, "render progress");
        if let Some(sink) = &mut self.sink {
            sink(percent);
        }
    }

    fn advance(&mut self) {
        self.done += 1;
        let percent = if self.total == 0 {
            100.0
        } else {
            (100.0 * self.done as f32 / self.total as f32).min(100.0)
        };
        self.report(percent);
    }
}

/// Renders graphs, optionally reporting percent complete.
///
/// Progress is reported as 0 on entry, after every processing stage, and
/// 100 on completion; values never decrease.
#[derive(Default)]
pub struct Renderer<'p> {
    progress: Option<&'p mut dyn FnMut(f32)>,
}

impl<'p> Renderer<'p> {
    pub fn new() -> Self {
        Renderer { progress: None }
    }

    pub fn with_progress(progress: &'p mut dyn FnMut(f32)) -> Self {
        Renderer {
            progress: Some(progress),
        }
    }

    /// Render `graph` over `input`. The output has the input's length,
    /// channel count and sample rate.
    pub fn render(&mut self, graph: &RenderGraph, input: &SampleBuffer) -> SampleBuffer {
        let Ok(output) = self.run(graph, input, &Uninterrupted);
        output
    }

    /// Like [`render`](Self::render), but stops between stages once
    /// `token` is cancelled.
    pub fn render_cancellable(
        &mut self,
        graph: &RenderGraph,
        input: &SampleBuffer,
        token: &CancelToken,
    ) -> Result<SampleBuffer, Cancelled> {
        self.run(graph, input, token)
    }

    pub(crate) fn run<I: Interrupt>(
        &mut self,
        graph: &RenderGraph,
        input: &SampleBuffer,
        interrupt: &I,
    ) -> Result<SampleBuffer, I::Error> {
        let ctx = RenderContext::for_buffer(input);
        let mut checkpoints = Checkpoints {
            done: 0,
            total: graph.stage_count(),
            sink: self.progress.as_deref_mut(),
        };
        checkpoints.report(0.0);
        interrupt.check()?;

        if input.is_empty() {
            checkpoints.report(100.0);
            return Ok(SampleBuffer::empty_like(input));
        }

        info!(
            frames = input.len(),
            channels = ctx.channels,
            sample_rate = ctx.sample_rate,
            stages = checkpoints.total,
            "rendering graph"
        );

        let mut channels = input.channels().to_vec();
        run_nodes(graph.nodes(), &mut channels, &ctx, &mut checkpoints, interrupt)?;
        checkpoints.report(100.0);

        Ok(SampleBuffer::from_planar(channels, ctx.sample_rate))
    }
}

fn run_nodes<I: Interrupt>(
    nodes: &[EffectNode],
    channels: &mut Vec<Vec<f32>>,
    ctx: &RenderContext,
    checkpoints: &mut Checkpoints<'_, '_>,
    interrupt: &I,
) -> Result<(), I::Error> {
    for node in nodes {
        if let EffectNode::Branch {
            dry,
            wet,
            nodes: inner,
        } = node
        {
            let (dry, wet) = (*dry, *wet);
            debug!(dry, wet, stages = inner.len(), "branch");
            if dry == 0.0 {
                run_nodes(inner, channels, ctx, checkpoints, interrupt)?;
                scale(channels, wet);
            } else {
                let mut send = channels.clone();
                run_nodes(inner, &mut send, ctx, checkpoints, interrupt)?;
                for (out, processed) in channels.iter_mut().zip(&send) {
                    for (x, &y) in out.iter_mut().zip(processed) {
                        *x = dry * *x + wet * y;
                    }
                }
            }
            continue;
        }

        interrupt.check()?;
        debug!(node = node.name(), "render stage");
        apply(node, channels, ctx);
        checkpoints.advance();
    }
    Ok(())
}

fn scale(channels: &mut [Vec<f32>], gain: f32) {
    if gain == 1.0 {
        return;
    }
    for s in channels.iter_mut().flat_map(|c| c.iter_mut()) {
        *s *= gain;
    }
}

/// Apply one leaf node in place.
fn apply(node: &EffectNode, channels: &mut [Vec<f32>], ctx: &RenderContext) {
    let rate = ctx.rate();
    match node {
        EffectNode::Gain { gain } => scale(channels, *gain),
        EffectNode::Biquad {
            kind,
            frequency,
            q,
            gain_db,
        } => {
            for ch in channels.iter_mut() {
                BiquadFilter::with_params(*kind, rate, *frequency, *q, *gain_db).process_block(ch);
            }
        }
        EffectNode::Compressor {
            threshold,
            knee,
            ratio,
            attack,
            release,
        } => {
            Compressor::with_params(rate, *threshold, *ratio, *attack, *release)
                .knee(*knee)
                .process_block(channels);
        }
        EffectNode::WaveShaper { curve, oversample } => {
            for ch in channels.iter_mut() {
                WaveShaper::new(curve, *oversample, rate).process_block(ch);
            }
        }
        EffectNode::Convolution { impulse, normalize } => {
            let convolver = Convolver::new(impulse.channels(), *normalize);
            for (c, ch) in channels.iter_mut().enumerate() {
                *ch = convolver.process(ch, c);
            }
        }
        EffectNode::StereoPan { position } => {
            if let [left, right] = channels {
                pan_stereo(left, right, *position);
            }
        }
        EffectNode::StereoWidth { width } => {
            if let [left, right] = channels {
                apply_width(left, right, *width);
            }
        }
        EffectNode::NoiseGate {
            threshold,
            attack,
            release,
        } => {
            NoiseGate::new(rate, *threshold, *attack, *release).process_block(channels);
        }
        // expanded by run_nodes
        EffectNode::Branch { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::filter::FilterType;

    fn ramp(frames: usize) -> SampleBuffer {
        let ch: Vec<f32> = (0..frames).map(|i| (i as f32 / frames as f32) - 0.5).collect();
        SampleBuffer::new(vec![ch.clone(), ch], 24000).unwrap()
    }

    fn sample_graph() -> RenderGraph {
        RenderGraph::new()
            .then(EffectNode::biquad(FilterType::Highpass, 30.0, 0.707, 0.0))
            .then(EffectNode::Branch {
                dry: 0.5,
                wet: 0.5,
                nodes: vec![
                    EffectNode::compressor(-20.0, 30.0, 2.5, 0.03, 0.25),
                    EffectNode::Gain { gain: 0.8 },
                ],
            })
            .then(EffectNode::StereoWidth { width: 0.8 })
            .then(EffectNode::compressor(-1.0, 0.0, 20.0, 0.001, 0.1))
    }

    #[test]
    fn output_matches_input_shape() {
        let input = ramp(5000);
        let out = Renderer::new().render(&sample_graph(), &input);
        assert_eq!(out.len(), input.len());
        assert_eq!(out.channel_count(), 2);
        assert_eq!(out.sample_rate(), 24000);
    }

    #[test]
    fn empty_graph_is_identity() {
        let input = ramp(100);
        assert_eq!(Renderer::new().render(&RenderGraph::new(), &input), input);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let input = SampleBuffer::silent(2, 0, 44100);
        let mut seen = Vec::new();
        let mut record = |p: f32| seen.push(p);
        let out = Renderer::with_progress(&mut record).render(&sample_graph(), &input);
        assert!(out.is_empty());
        assert_eq!(out.channel_count(), 2);
        assert_eq!(seen, vec![0.0, 100.0]);
    }

    #[test]
    fn progress_is_monotonic_and_complete() {
        let graph = sample_graph();
        let mut seen = Vec::new();
        let mut record = |p: f32| seen.push(p);
        Renderer::with_progress(&mut record).render(&graph, &ramp(2000));

        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&100.0));
        assert_eq!(seen.len(), graph.stage_count() + 2);
        assert!(
            seen.windows(2).all(|w| w[0] <= w[1]),
            "progress went backwards: {seen:?}"
        );
    }

    #[test]
    fn branch_blends_dry_and_wet() {
        let graph = RenderGraph::new().then(EffectNode::Branch {
            dry: 0.25,
            wet: 0.5,
            nodes: vec![EffectNode::Gain { gain: 2.0 }],
        });
        let input = SampleBuffer::from_mono(vec![1.0, -0.5], 8000);
        let out = Renderer::new().render(&graph, &input);
        // 0.25·x + 0.5·2x = 1.25·x
        assert_eq!(out.channel(0), &[1.25, -0.625]);
    }

    #[test]
    fn fully_wet_branch_replaces_signal() {
        let graph = RenderGraph::new().then(EffectNode::Branch {
            dry: 0.0,
            wet: 0.5,
            nodes: vec![EffectNode::Gain { gain: 0.5 }],
        });
        let input = SampleBuffer::from_mono(vec![1.0; 4], 8000);
        let out = Renderer::new().render(&graph, &input);
        assert_eq!(out.channel(0), &[0.25; 4]);
    }

    #[test]
    fn stereo_nodes_leave_mono_alone() {
        let graph = RenderGraph::new()
            .then(EffectNode::StereoPan { position: 1.0 })
            .then(EffectNode::StereoWidth { width: 0.0 });
        let input = SampleBuffer::from_mono(vec![0.3, -0.3, 0.1], 8000);
        assert_eq!(Renderer::new().render(&graph, &input), input);
    }

    #[test]
    fn convolution_with_unit_impulse_is_identity() {
        let impulse = Arc::new(SampleBuffer::from_mono(vec![1.0], 24000));
        let graph = RenderGraph::new().then(EffectNode::Convolution {
            impulse,
            normalize: false,
        });
        let input = ramp(700);
        let out = Renderer::new().render(&graph, &input);
        for (a, b) in out.channel(1).iter().zip(input.channel(1)) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn cancelled_token_stops_render() {
        let token = CancelToken::new();
        token.cancel();
        let result = Renderer::new().render_cancellable(&sample_graph(), &ramp(1000), &token);
        assert_eq!(result, Err(Cancelled));
    }

    #[test]
    fn cancel_mid_render_from_progress() {
        let token = CancelToken::new();
        let flag = token.clone();
        let mut calls = 0;
        let mut cancel_after_first_stage = |p: f32| {
            calls += 1;
            if p > 0.0 {
                flag.cancel();
            }
        };
        let result = Renderer::with_progress(&mut cancel_after_first_stage).render_cancellable(
            &sample_graph(),
            &ramp(1000),
            &token,
        );
        assert_eq!(result, Err(Cancelled));
        assert_eq!(calls, 2, "render should stop right after the first stage");
    }

    #[test]
    fn live_token_completes() {
        let token = CancelToken::new();
        let input = ramp(300);
        let out = Renderer::new()
            .render_cancellable(&sample_graph(), &input, &token)
            .unwrap();
        assert_eq!(out.len(), 300);
    }
}
