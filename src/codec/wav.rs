//! WAV container: canonical 16-bit PCM encoder and a hound-backed decoder.

use std::io::{Cursor, ErrorKind};

use crate::buffer::SampleBuffer;
use crate::error::{DecodeError, EncodeError};

use super::float_to_i16;

const CONTAINER: &str = "WAV";
const HEADER_LEN: usize = 44;

/// Encode a buffer as a 16-bit PCM WAV file with the canonical 44-byte header.
///
/// Samples are clamped to [-1, 1] and interleaved in channel order. The
/// output is bit-identical for identical input.
pub fn encode_wav(buffer: &SampleBuffer) -> Result<Vec<u8>, EncodeError> {
    let channels = u16::try_from(buffer.channel_count())
        .map_err(|_| EncodeError::TooManyChannels(buffer.channel_count()))?;
    let sample_rate = buffer.sample_rate();
    let bits_per_sample: u16 = 16;
    let block_align = channels
        .checked_mul(bits_per_sample / 8)
        .ok_or(EncodeError::TooManyChannels(buffer.channel_count()))?;
    let byte_rate = sample_rate as u64 * block_align as u64;

    let data_bytes = buffer.len() as u64 * block_align as u64;
    // RIFF size field covers 36 header bytes plus the data chunk.
    if data_bytes + 36 > u32::MAX as u64 || byte_rate > u32::MAX as u64 {
        return Err(EncodeError::TooLarge { bytes: data_bytes });
    }
    let data_size = data_bytes as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(HEADER_LEN + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(byte_rate as u32).to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for i in 0..buffer.len() {
        for ch in buffer.channels() {
            buf.extend_from_slice(&float_to_i16(ch[i]).to_le_bytes());
        }
    }

    Ok(buf)
}

/// Decode a RIFF/WAVE file at its native rate and channel count.
pub fn decode_wav(bytes: &[u8]) -> Result<SampleBuffer, DecodeError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).map_err(wav_error)?;
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(DecodeError::Malformed {
            container: CONTAINER,
            reason: format!("{} channels at {} Hz", spec.channels, spec.sample_rate),
        });
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(DecodeError::Unsupported {
                    container: CONTAINER,
                    reason: format!("{}-bit float samples", spec.bits_per_sample),
                });
            }
            reader
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(wav_error)?
        }
        hound::SampleFormat::Int => {
            if !(8..=32).contains(&spec.bits_per_sample) {
                return Err(DecodeError::Unsupported {
                    container: CONTAINER,
                    reason: format!("{}-bit integer samples", spec.bits_per_sample),
                });
            }
            // Inverse of the encoder: negative full scale is 2^(bits-1),
            // positive full scale one less.
            let negative = (1i64 << (spec.bits_per_sample - 1)) as f64;
            let positive = negative - 1.0;
            reader
                .samples::<i32>()
                .map(|s| {
                    s.map(|x| {
                        let scale = if x < 0 { negative } else { positive };
                        (x as f64 / scale) as f32
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(wav_error)?
        }
    };

    Ok(SampleBuffer::from_interleaved(
        &samples,
        spec.channels as usize,
        spec.sample_rate,
    ))
}

fn wav_error(e: hound::Error) -> DecodeError {
    match e {
        hound::Error::IoError(io) if io.kind() == ErrorKind::UnexpectedEof => {
            DecodeError::Truncated {
                container: CONTAINER,
            }
        }
        hound::Error::IoError(io) => DecodeError::Io(io),
        hound::Error::UnfinishedSample => DecodeError::Truncated {
            container: CONTAINER,
        },
        hound::Error::Unsupported => DecodeError::Unsupported {
            container: CONTAINER,
            reason: "format not handled by the decoder".to_string(),
        },
        other => DecodeError::Malformed {
            container: CONTAINER,
            reason: other.to_string(),
        },
    }
}
