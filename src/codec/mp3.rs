//! MPEG audio decoding via minimp3.

use std::io::Cursor;

use minimp3::{Decoder, Error};

use crate::buffer::SampleBuffer;
use crate::error::DecodeError;

const CONTAINER: &str = "MP3";

/// Decode every frame of an MP3 stream into one buffer at the stream's
/// native rate and channel count.
pub fn decode_mp3(bytes: &[u8]) -> Result<SampleBuffer, DecodeError> {
    let mut decoder = Decoder::new(Cursor::new(bytes));
    let mut interleaved: Vec<f32> = Vec::new();
    let mut layout: Option<(usize, u32)> = None;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if frame.channels == 0 || frame.sample_rate <= 0 {
                    continue;
                }
                let (channels, _) =
                    *layout.get_or_insert((frame.channels, frame.sample_rate as u32));
                if frame.channels != channels {
                    return Err(DecodeError::Malformed {
                        container: CONTAINER,
                        reason: format!(
                            "channel count changed from {channels} to {} mid-stream",
                            frame.channels
                        ),
                    });
                }
                interleaved.extend(frame.data.iter().map(|&s| s as f32 / 32768.0));
            }
            Err(Error::Eof) => break,
            Err(Error::Io(e)) => return Err(DecodeError::Io(e)),
            Err(Error::InsufficientData) => {
                return Err(DecodeError::Truncated {
                    container: CONTAINER,
                });
            }
            Err(e) => {
                return Err(DecodeError::Malformed {
                    container: CONTAINER,
                    reason: format!("{e:?}"),
                });
            }
        }
    }

    let (channels, sample_rate) = layout.ok_or(DecodeError::NoAudio)?;
    Ok(SampleBuffer::from_interleaved(
        &interleaved,
        channels,
        sample_rate,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_after_id3_has_no_audio() {
        let mut bytes = b"ID3\x04\x00\x00\x00\x00\x00\x00".to_vec();
        bytes.extend(std::iter::repeat(0u8).take(512));
        assert!(decode_mp3(&bytes).is_err());
    }

    #[test]
    fn empty_stream_has_no_audio() {
        assert!(matches!(decode_mp3(&[]), Err(DecodeError::NoAudio)));
    }
}
