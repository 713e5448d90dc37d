use crate::foundation::core::Dimensions;

/// Convenience result type for the pipeline entry points.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failures while turning raw bytes into a [`crate::MediaSource`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Zero-byte payload, or the payload ends before the container does.
    #[error("decode error: truncated payload")]
    Truncated,

    /// The container is not one the declared media kind can be decoded from.
    #[error("decode error: unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The container was recognized but its contents could not be decoded.
    #[error("decode error: malformed media: {0}")]
    Malformed(String),

    /// Decoded frames violate a media source invariant (no frames, zero rate, size mismatch).
    #[error("decode error: invalid source: {0}")]
    InvalidSource(String),

    /// External decoding tool (`ffmpeg`/`ffprobe`) missing or failing.
    #[error("decode error: tool failure: {0}")]
    Tool(String),
}

impl DecodeError {
    /// Build a [`DecodeError::UnsupportedFormat`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Build a [`DecodeError::Malformed`] value.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Build a [`DecodeError::InvalidSource`] value.
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::InvalidSource(msg.into())
    }

    /// Build a [`DecodeError::Tool`] value.
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }
}

/// Failures while serializing composited frames.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A video container was requested for fewer than two frames.
    #[error("encode error: video output needs at least 2 frames, got {frames}")]
    DegenerateVideo {
        /// Number of frames supplied.
        frames: usize,
    },

    /// A frame's dimensions differ from the first frame's.
    #[error("encode error: frame {index} is {actual}, expected {expected}")]
    InconsistentDimensions {
        /// Index of the offending frame.
        index: usize,
        /// Dimensions of frame 0.
        expected: Dimensions,
        /// Dimensions of the offending frame.
        actual: Dimensions,
    },

    /// No frames were supplied.
    #[error("encode error: no frames to encode")]
    EmptySequence,

    /// The in-process image codec rejected the frames.
    #[error("encode error: codec failure: {0}")]
    Codec(String),

    /// External encoding tool (`ffmpeg`) missing or failing.
    #[error("encode error: tool failure: {0}")]
    Tool(String),
}

impl EncodeError {
    /// Build a [`EncodeError::Codec`] value.
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Build a [`EncodeError::Tool`] value.
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }
}

/// Top-level error taxonomy returned by [`crate::OverlayEngine`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Speed factor outside `[0.1, 3.0]` (or NaN).
    #[error("pipeline error: speed {0} is outside [0.1, 3.0]")]
    InvalidSpeed(f64),

    /// Request parameters other than speed are unusable.
    #[error("pipeline error: invalid request: {0}")]
    InvalidRequest(String),

    /// The overlay asset does not satisfy the engine's requirements.
    #[error("pipeline error: invalid overlay: {0}")]
    InvalidOverlay(String),

    /// Engine configuration could not be parsed or validated.
    #[error("pipeline error: invalid config: {0}")]
    Config(String),

    /// Decoding the base input failed.
    #[error(transparent)]
    DecodeFailed(#[from] DecodeError),

    /// Encoding the composited output failed.
    #[error(transparent)]
    EncodeFailed(#[from] EncodeError),
}

impl PipelineError {
    /// Build a [`PipelineError::InvalidRequest`] value.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Build a [`PipelineError::InvalidOverlay`] value.
    pub fn invalid_overlay(msg: impl Into<String>) -> Self {
        Self::InvalidOverlay(msg.into())
    }

    /// Build a [`PipelineError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
