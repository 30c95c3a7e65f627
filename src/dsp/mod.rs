//! DSP primitives: filters, dynamics, oscillators and convolution.
//!
//! Everything here renders offline over whole buffers. The signal-graph
//! renderer interprets effect nodes with these types, and the composer
//! drives them directly for synthesis.

pub mod compressor;
pub mod convolver;
pub mod envelope;
pub mod filter;
pub mod gate;
pub mod mixer;
pub mod noise;
pub mod oscillator;
pub mod stereo;
pub mod waveshaper;
