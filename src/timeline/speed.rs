use std::sync::Arc;

use crate::foundation::error::PipelineError;
use crate::media::source::Sequence;

/// Overlay playback speed, validated to `[SpeedFactor::MIN, SpeedFactor::MAX]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, serde::Serialize)]
pub struct SpeedFactor(f64);

impl SpeedFactor {
    /// Slowest accepted factor.
    pub const MIN: f64 = 0.1;
    /// Fastest accepted factor.
    pub const MAX: f64 = 3.0;
    /// Original speed.
    pub const NORMAL: Self = Self(1.0);

    /// Validate a raw factor. NaN and values outside the domain yield
    /// [`PipelineError::InvalidSpeed`].
    pub fn new(factor: f64) -> Result<Self, PipelineError> {
        if (Self::MIN..=Self::MAX).contains(&factor) {
            Ok(Self(factor))
        } else {
            Err(PipelineError::InvalidSpeed(factor))
        }
    }

    /// The raw factor.
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for SpeedFactor {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl<'de> serde::Deserialize<'de> for SpeedFactor {
    fn deserialize<D: serde::Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(de)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Retime `overlay` by `factor` while keeping its frame rate.
///
/// The result holds `max(1, round(n / factor))` frames; output frame `j` shows source frame
/// `min(floor(j * factor), n - 1)`. Faster factors stride over source frames, slower ones hold
/// them. Effective duration becomes `original / factor` to within one frame interval. Frames are
/// shared with the input, never copied.
pub fn apply(overlay: &Sequence, factor: SpeedFactor) -> Sequence {
    let n = overlay.len();
    let f = factor.get();
    if f == 1.0 {
        return overlay.clone();
    }

    let out_len = ((n as f64) / f).round().max(1.0) as usize;
    let src = overlay.frames();
    let frames: Vec<_> = (0..out_len)
        .map(|j| {
            let idx = ((j as f64) * f).floor() as usize;
            Arc::clone(&src[idx.min(n - 1)])
        })
        .collect();

    overlay.with_frames(frames)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/speed.rs"]
mod tests;
