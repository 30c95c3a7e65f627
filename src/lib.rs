pub mod buffer;
pub mod codec;
pub mod compose;
pub mod config;
pub mod dsp;
pub mod error;
pub mod graph;
#[cfg(feature = "jobs")]
pub mod jobs;
pub mod mixdown;

pub use buffer::{SampleBuffer, resample_linear};
pub use codec::{
    ContainerHint, decode, encode_wav, extract_snippet, float_to_pcm16, pcm16_to_float,
};
pub use compose::{ComposeRequest, compose, compose_backing, compose_cancellable};
pub use config::FilterConfig;
pub use error::{Cancelled, DecodeError, EncodeError, EngineError};
pub use graph::remaster::{remaster, remaster_cancellable, remaster_graph};
pub use graph::{CancelToken, EffectNode, RenderContext, RenderGraph, Renderer};
pub use mixdown::{mixdown, mixdown_cancellable};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed: return the stemforge-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: decode an uploaded file, remaster it and return WAV bytes.
/// `config` is a camelCase `FilterConfig` object; `undefined` uses defaults.
#[wasm_bindgen]
pub fn remaster_wav(bytes: &[u8], config: JsValue) -> Result<Vec<u8>, JsValue> {
    let config: FilterConfig = if config.is_undefined() || config.is_null() {
        FilterConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config).map_err(js_error)?
    };
    let input = decode(bytes, ContainerHint::Auto).map_err(js_error)?;
    let output = remaster(&input, &config, None);
    encode_wav(&output).map_err(js_error)
}

/// WASM-exposed: compose a backing track and return WAV bytes.
/// `chords` is an array of chord symbols.
#[wasm_bindgen]
pub fn compose_backing_wav(
    bpm: f64,
    chords: JsValue,
    genre: &str,
    seconds: f64,
) -> Result<Vec<u8>, JsValue> {
    let chords: Vec<String> = serde_wasm_bindgen::from_value(chords).map_err(js_error)?;
    encode_wav(&compose_backing(bpm, &chords[..], genre, seconds)).map_err(js_error)
}

/// WASM-exposed: compose from a full camelCase `ComposeRequest` object.
#[wasm_bindgen]
pub fn compose_request_wav(request: JsValue) -> Result<Vec<u8>, JsValue> {
    let request: ComposeRequest = serde_wasm_bindgen::from_value(request).map_err(js_error)?;
    encode_wav(&compose(&request)).map_err(js_error)
}

/// WASM-exposed: mix a raw 16-bit mono vocal over a WAV backing track.
#[wasm_bindgen]
pub fn mixdown_wav(
    vocal_pcm16: &[u8],
    vocal_rate: u32,
    backing_wav: &[u8],
) -> Result<Vec<u8>, JsValue> {
    let vocal = pcm16_to_float(vocal_pcm16, vocal_rate);
    let backing = decode(backing_wav, ContainerHint::Wav).map_err(js_error)?;
    encode_wav(&mixdown(&vocal, &backing)).map_err(js_error)
}

/// WASM-exposed: the first `max_seconds` of an uploaded file as WAV.
#[wasm_bindgen]
pub fn snippet_wav(bytes: &[u8], max_seconds: f64) -> Result<Vec<u8>, JsValue> {
    let input = decode(bytes, ContainerHint::Auto).map_err(js_error)?;
    encode_wav(&extract_snippet(&input, max_seconds)).map_err(js_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_manifest() {
        assert_eq!(core_version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn upload_to_remaster_to_wav() {
        let ch: Vec<f32> = (0..8000).map(|i| 0.4 * (i as f32 * 0.1).sin()).collect();
        let upload =
            encode_wav(&SampleBuffer::new(vec![ch.clone(), ch], 16000).unwrap()).unwrap();

        let input = decode(&upload, ContainerHint::Auto).unwrap();
        let out = remaster(&input, &FilterConfig::with_eq(2.0, -1.0, 3.0), None);
        let wav = encode_wav(&out).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(wav.len(), 44 + 8000 * 2 * 2);
    }

    #[test]
    fn compose_then_mix_vocal() {
        let backing = compose_backing(100.0, &["C", "G"], "pop", 1.0);
        let pcm = float_to_pcm16(&SampleBuffer::from_mono(vec![0.1; 12000], 24000));
        let vocal = pcm16_to_float(&pcm, 24000);
        let mixed = mixdown(&vocal, &backing);
        assert_eq!(mixed.len(), 24000);
        let snippet = extract_snippet(&mixed, 0.25);
        assert_eq!(snippet.len(), 6000);
    }
}
