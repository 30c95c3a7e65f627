use std::fmt;

/// Top-level error for a render request.
#[derive(Debug)]
pub enum EngineError {
    Decode(DecodeError),
    Encode(EncodeError),
    Cancelled,
    /// The worker running the request panicked or was aborted.
    Join(String),
}

/// Malformed or unsupported input bytes. Fatal to the request.
#[derive(Debug)]
pub enum DecodeError {
    UnrecognizedContainer,
    Truncated { container: &'static str },
    Malformed { container: &'static str, reason: String },
    Unsupported { container: &'static str, reason: String },
    NoAudio,
    Io(std::io::Error),
}

/// A buffer invariant was violated. Indicates a bug upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeError {
    NoChannels,
    InvalidSampleRate(u32),
    ChannelLengthMismatch { expected: usize, found: usize, channel: usize },
    TooManyChannels(usize),
    TooLarge { bytes: u64 },
}

/// A render stopped early because its `CancelToken` fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Decode(e) => write!(f, "Decode error: {e}"),
            EngineError::Encode(e) => write!(f, "Encode error: {e}"),
            EngineError::Cancelled => write!(f, "Render cancelled"),
            EngineError::Join(msg) => write!(f, "Render worker failed: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnrecognizedContainer => write!(f, "Unrecognized audio container"),
            DecodeError::Truncated { container } => write!(f, "Truncated {container} data"),
            DecodeError::Malformed { container, reason } => {
                write!(f, "Malformed {container} data: {reason}")
            }
            DecodeError::Unsupported { container, reason } => {
                write!(f, "Unsupported {container} input: {reason}")
            }
            DecodeError::NoAudio => write!(f, "Input contains no audio frames"),
            DecodeError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::NoChannels => write!(f, "Buffer has no channels"),
            EncodeError::InvalidSampleRate(rate) => write!(f, "Invalid sample rate {rate}"),
            EncodeError::ChannelLengthMismatch { expected, found, channel } => write!(
                f,
                "Channel {channel} has {found} samples, expected {expected}"
            ),
            EncodeError::TooManyChannels(n) => write!(f, "Too many channels for WAV: {n}"),
            EncodeError::TooLarge { bytes } => {
                write!(f, "WAV data chunk of {bytes} bytes exceeds the 4 GiB limit")
            }
        }
    }
}

impl std::error::Error for EncodeError {}

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Render cancelled")
    }
}

impl std::error::Error for Cancelled {}

impl From<DecodeError> for EngineError {
    fn from(e: DecodeError) -> Self {
        EngineError::Decode(e)
    }
}

impl From<EncodeError> for EngineError {
    fn from(e: EncodeError) -> Self {
        EngineError::Encode(e)
    }
}

impl From<Cancelled> for EngineError {
    fn from(_: Cancelled) -> Self {
        EngineError::Cancelled
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(e: std::io::Error) -> Self {
        DecodeError::Io(e)
    }
}
