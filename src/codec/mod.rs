//! Sample Codec: container bytes in, `SampleBuffer` out, and back to WAV.
//!
//! Decoding keeps the file's native sample rate and channel count. The only
//! encoded format is canonical 16-bit PCM WAV.

#[cfg(feature = "mp3")]
pub mod mp3;
pub mod wav;

use tracing::{debug, warn};

use crate::buffer::SampleBuffer;
use crate::error::DecodeError;

pub use wav::encode_wav;

/// Which container the caller believes the bytes are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerHint {
    /// Sniff the magic bytes.
    #[default]
    Auto,
    Wav,
    Mp3,
}

impl ContainerHint {
    /// Map a file extension or MIME subtype ("wav", "audio/mpeg", ...).
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        let tail = name.rsplit(['.', '/']).next().unwrap_or("");
        match tail {
            "wav" | "wave" | "x-wav" | "vnd.wave" => ContainerHint::Wav,
            "mp3" | "mpeg" | "mpga" => ContainerHint::Mp3,
            _ => ContainerHint::Auto,
        }
    }
}

fn sniff(bytes: &[u8]) -> Option<ContainerHint> {
    if bytes.starts_with(b"RIFF") && (bytes.len() < 12 || &bytes[8..12] == b"WAVE") {
        return Some(ContainerHint::Wav);
    }
    if bytes.starts_with(b"ID3")
        || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0)
    {
        return Some(ContainerHint::Mp3);
    }
    None
}

/// Decode container audio into a float buffer.
pub fn decode(bytes: &[u8], hint: ContainerHint) -> Result<SampleBuffer, DecodeError> {
    let container = match hint {
        ContainerHint::Auto => sniff(bytes).ok_or(DecodeError::UnrecognizedContainer),
        explicit => Ok(explicit),
    };

    let result = container.and_then(|c| match c {
        ContainerHint::Wav => wav::decode_wav(bytes),
        ContainerHint::Mp3 => decode_mpeg(bytes),
        ContainerHint::Auto => Err(DecodeError::UnrecognizedContainer),
    });

    match &result {
        Ok(buf) => debug!(
            rate = buf.sample_rate(),
            channels = buf.channel_count(),
            frames = buf.len(),
            "decoded input"
        ),
        Err(e) => warn!(bytes = bytes.len(), "decode failed: {e}"),
    }
    result
}

#[cfg(feature = "mp3")]
fn decode_mpeg(bytes: &[u8]) -> Result<SampleBuffer, DecodeError> {
    mp3::decode_mp3(bytes)
}

#[cfg(not(feature = "mp3"))]
fn decode_mpeg(_bytes: &[u8]) -> Result<SampleBuffer, DecodeError> {
    Err(DecodeError::Unsupported {
        container: "MP3",
        reason: "built without the `mp3` feature".to_string(),
    })
}

/// Float → i16 with the encoder's asymmetric scaling, truncating toward zero.
#[inline]
pub(crate) fn float_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Headerless little-endian 16-bit mono PCM (externally supplied vocal stems).
/// A trailing odd byte is ignored.
pub fn pcm16_to_float(bytes: &[u8], sample_rate: u32) -> SampleBuffer {
    let samples = bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect();
    SampleBuffer::from_mono(samples, sample_rate)
}

/// Inverse of [`pcm16_to_float`]. Multi-channel buffers are interleaved.
pub fn float_to_pcm16(buffer: &SampleBuffer) -> Vec<u8> {
    let mut out = Vec::with_capacity(buffer.len() * buffer.channel_count() * 2);
    for i in 0..buffer.len() {
        for ch in buffer.channels() {
            out.extend_from_slice(&float_to_i16(ch[i]).to_le_bytes());
        }
    }
    out
}

/// Truncate to at most `max_seconds` of audio. Never pads; empty or
/// non-positive requests give an empty buffer with the same layout.
pub fn extract_snippet(buffer: &SampleBuffer, max_seconds: f64) -> SampleBuffer {
    if buffer.is_empty() || !(max_seconds > 0.0) {
        return SampleBuffer::empty_like(buffer);
    }
    let limit = (max_seconds * buffer.sample_rate() as f64).floor();
    let frames = if limit >= buffer.len() as f64 {
        buffer.len()
    } else {
        limit as usize
    };
    buffer.truncated(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, rate: u32, frames: usize) -> SampleBuffer {
        let samples = (0..frames)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin() * 0.8)
            .collect();
        SampleBuffer::from_mono(samples, rate)
    }

    #[test]
    fn auto_detects_wav() {
        let buf = sine(440.0, 24000, 480);
        let wav = encode_wav(&buf).unwrap();
        let decoded = decode(&wav, ContainerHint::Auto).unwrap();
        assert_eq!(decoded.len(), 480);
        assert_eq!(decoded.sample_rate(), 24000);
    }

    #[test]
    fn encode_decode_encode_is_stable() {
        let buf = SampleBuffer::new(
            vec![
                sine(220.0, 44100, 1000).into_channels().remove(0),
                sine(330.0, 44100, 1000).into_channels().remove(0),
            ],
            44100,
        )
        .unwrap();
        let first = encode_wav(&buf).unwrap();
        let decoded = decode(&first, ContainerHint::Wav).unwrap();
        for (a, b) in buf.channels().iter().zip(decoded.channels()) {
            for (&x, &y) in a.iter().zip(b) {
                assert!((x - y).abs() <= 1.0 / 32768.0 + 1e-7);
            }
        }
        let second = encode_wav(&decoded).unwrap();
        assert!(second == first, "re-encode is not byte-identical");
    }

    #[test]
    fn unrecognized_bytes_fail() {
        assert!(matches!(
            decode(b"OggS\x00\x02not really", ContainerHint::Auto),
            Err(DecodeError::UnrecognizedContainer)
        ));
        assert!(matches!(
            decode(&[], ContainerHint::Auto),
            Err(DecodeError::UnrecognizedContainer)
        ));
    }

    #[test]
    fn truncated_riff_fails() {
        assert!(decode(b"RIFF", ContainerHint::Auto).is_err());
    }

    #[test]
    fn hint_from_name() {
        assert_eq!(ContainerHint::from_name("take.WAV"), ContainerHint::Wav);
        assert_eq!(ContainerHint::from_name("audio/mpeg"), ContainerHint::Mp3);
        assert_eq!(ContainerHint::from_name("clip.flac"), ContainerHint::Auto);
    }

    #[test]
    fn pcm16_decode_scaling() {
        let bytes = [0x00, 0x80, 0xFF, 0x7F, 0x00, 0x00, 0x01];
        let buf = pcm16_to_float(&bytes, 24000);
        assert_eq!(buf.channel_count(), 1);
        assert_eq!(buf.len(), 3, "odd trailing byte ignored");
        assert_eq!(buf.channel(0)[0], -1.0);
        assert!((buf.channel(0)[1] - 32767.0 / 32768.0).abs() < 1e-9);
        assert_eq!(buf.channel(0)[2], 0.0);
    }

    #[test]
    fn pcm16_roundtrip_is_exact_for_quantized_input() {
        let bytes: Vec<u8> = [-32768_i16, -1, 0, 1, 12345, 32767]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let back = float_to_pcm16(&pcm16_to_float(&bytes, 24000));
        // Negative values scale by 32768 so they survive exactly.
        assert_eq!(&back[..6], &bytes[..6]);
        assert_eq!(back.len(), bytes.len());
    }

    #[test]
    fn snippet_truncates() {
        let buf = sine(440.0, 1000, 5000);
        let clip = extract_snippet(&buf, 2.0);
        assert_eq!(clip.len(), 2000);
        assert_eq!(clip.channel(0), &buf.channel(0)[..2000]);
    }

    #[test]
    fn snippet_never_pads() {
        let buf = sine(440.0, 1000, 500);
        assert_eq!(extract_snippet(&buf, 30.0).len(), 500);
    }

    #[test]
    fn snippet_of_empty_or_invalid_is_empty() {
        let stereo = SampleBuffer::silent(2, 0, 24000);
        let clip = extract_snippet(&stereo, 10.0);
        assert!(clip.is_empty());
        assert_eq!(clip.channel_count(), 2);

        let buf = sine(440.0, 1000, 500);
        assert!(extract_snippet(&buf, 0.0).is_empty());
        assert!(extract_snippet(&buf, -1.0).is_empty());
        assert!(extract_snippet(&buf, f64::NAN).is_empty());
    }
}
