//! Serialize composited frames into a transport-ready artifact.

pub(crate) mod animated;
pub(crate) mod artifact;
pub(crate) mod video;

use std::sync::Arc;

use crate::encode::artifact::{ContainerKind, OutputArtifact, OutputFormat};
use crate::foundation::error::EncodeError;
use crate::media::source::RgbaFrame;
use crate::timeline::window::CompositeWindow;

/// Encoder settings that do not depend on the frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeOpts {
    /// Straight-alpha color used to flatten transparency for video output.
    pub background_rgba: [u8; 4],
    /// libx264 constant rate factor (0-51, lower is better quality).
    pub video_crf: u8,
}

impl Default for EncodeOpts {
    fn default() -> Self {
        Self {
            background_rgba: [0, 0, 0, 255],
            video_crf: 23,
        }
    }
}

/// Encode `frames`, played at `window.fps`, into `target`.
///
/// Every frame must share the first frame's dimensions. A [`ContainerKind::Video`] target needs at
/// least two frames; an [`ContainerKind::AnimatedImage`] target with one frame is written as PNG,
/// otherwise as a looping GIF.
#[tracing::instrument(level = "debug", skip_all, fields(frames = frames.len(), target = ?target))]
pub fn encode(
    frames: &[Arc<RgbaFrame>],
    window: &CompositeWindow,
    target: ContainerKind,
    opts: &EncodeOpts,
) -> Result<OutputArtifact, EncodeError> {
    let first = frames.first().ok_or(EncodeError::EmptySequence)?;
    let expected = first.dimensions();
    if let Some((index, f)) = frames
        .iter()
        .enumerate()
        .find(|(_, f)| f.dimensions() != expected)
    {
        return Err(EncodeError::InconsistentDimensions {
            index,
            expected,
            actual: f.dimensions(),
        });
    }

    let (bytes, format) = match target {
        ContainerKind::Video => {
            if frames.len() < 2 {
                return Err(EncodeError::DegenerateVideo {
                    frames: frames.len(),
                });
            }
            let bytes =
                video::encode_mp4(frames, window.fps, opts.background_rgba, opts.video_crf)?;
            (bytes, OutputFormat::Mp4)
        }
        ContainerKind::AnimatedImage if frames.len() == 1 => {
            (animated::encode_png(first)?, OutputFormat::Png)
        }
        ContainerKind::AnimatedImage => {
            (animated::encode_gif(frames, window.fps)?, OutputFormat::Gif)
        }
    };

    tracing::debug!(bytes = bytes.len(), format = format.extension(), "encoded output");
    Ok(OutputArtifact {
        bytes,
        container: target,
        format,
        dimensions: expected,
        frame_count: frames.len(),
    })
}

#[cfg(test)]
#[path = "../tests/unit/encode.rs"]
mod tests;
