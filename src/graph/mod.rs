//! Signal Graph: declarative effect chains over whole buffers.
//!
//! A [`RenderGraph`] is an ordered list of [`EffectNode`]s. The input buffer
//! is the source and the renderer's return value is the sink. Fan-out and
//! fan-in (sends, dry/wet blends) are expressed with [`EffectNode::Branch`],
//! so every graph is a DAG by construction. Graphs are built per request,
//! rendered once and dropped.

pub mod remaster;
pub mod renderer;

use std::sync::Arc;

use crate::buffer::SampleBuffer;
use crate::dsp::filter::FilterType;

pub use renderer::{CancelToken, Renderer};

/// One processing stage.
#[derive(Debug, Clone)]
pub enum EffectNode {
    /// Multiply every sample.
    Gain { gain: f32 },
    /// One biquad per channel.
    Biquad {
        kind: FilterType,
        frequency: f64,
        q: f64,
        gain_db: f64,
    },
    /// Linked-detection compressor; times in seconds, levels in dB.
    Compressor {
        threshold: f64,
        knee: f64,
        ratio: f64,
        attack: f64,
        release: f64,
    },
    /// Static transfer curve, optionally oversampled.
    WaveShaper { curve: Arc<[f32]>, oversample: usize },
    /// Convolve channel `c` with impulse channel `c mod n`.
    Convolution {
        impulse: Arc<SampleBuffer>,
        normalize: bool,
    },
    /// Equal-power pan of a stereo pair. Mono buffers pass through.
    StereoPan { position: f32 },
    /// Mid/side width, 0.5 = unchanged. Mono buffers pass through.
    StereoWidth { width: f32 },
    /// Threshold gate; times in seconds.
    NoiseGate {
        threshold: f64,
        attack: f64,
        release: f64,
    },
    /// Fork/join: `dry · x + wet · nodes(x)`.
    Branch {
        dry: f32,
        wet: f32,
        nodes: Vec<EffectNode>,
    },
}

impl EffectNode {
    pub fn biquad(kind: FilterType, frequency: f64, q: f64, gain_db: f64) -> Self {
        EffectNode::Biquad {
            kind,
            frequency,
            q,
            gain_db,
        }
    }

    pub fn compressor(threshold: f64, knee: f64, ratio: f64, attack: f64, release: f64) -> Self {
        EffectNode::Compressor {
            threshold,
            knee,
            ratio,
            attack,
            release,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            EffectNode::Gain { .. } => "gain",
            EffectNode::Biquad { .. } => "biquad",
            EffectNode::Compressor { .. } => "compressor",
            EffectNode::WaveShaper { .. } => "waveshaper",
            EffectNode::Convolution { .. } => "convolution",
            EffectNode::StereoPan { .. } => "stereo-pan",
            EffectNode::StereoWidth { .. } => "stereo-width",
            EffectNode::NoiseGate { .. } => "noise-gate",
            EffectNode::Branch { .. } => "branch",
        }
    }

    /// Processing stages under this node (branches count their children).
    fn stage_count(&self) -> usize {
        match self {
            EffectNode::Branch { nodes, .. } => nodes.iter().map(EffectNode::stage_count).sum(),
            _ => 1,
        }
    }
}

/// An ordered chain of effect nodes.
#[derive(Debug, Clone, Default)]
pub struct RenderGraph {
    nodes: Vec<EffectNode>,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, builder style.
    pub fn then(mut self, node: EffectNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn push(&mut self, node: EffectNode) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[EffectNode] {
        &self.nodes
    }

    /// Number of leaf stages, i.e. progress checkpoints.
    pub fn stage_count(&self) -> usize {
        self.nodes.iter().map(EffectNode::stage_count).sum()
    }
}

/// Per-render context: everything a node needs to know about the buffer
/// it runs on. Created fresh from the input of each render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    pub sample_rate: u32,
    pub channels: usize,
}

impl RenderContext {
    pub fn for_buffer(buffer: &SampleBuffer) -> Self {
        RenderContext {
            sample_rate: buffer.sample_rate(),
            channels: buffer.channel_count(),
        }
    }

    pub fn rate(&self) -> f64 {
        self.sample_rate as f64
    }
}
