use crate::foundation::core::Dimensions;

/// Container family chosen for the composited result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerKind {
    /// Compressed video (MP4/H.264).
    Video,
    /// Animated image (looping GIF), or a PNG when only one frame exists.
    AnimatedImage,
}

impl ContainerKind {
    /// Video for a time-varying base whose window holds at least two frames, otherwise an
    /// animated image.
    pub fn select(base_is_sequence: bool, frame_count: u64) -> Self {
        if base_is_sequence && frame_count >= 2 {
            Self::Video
        } else {
            Self::AnimatedImage
        }
    }
}

/// Concrete file format of an [`OutputArtifact`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Fragmented MP4, H.264 yuv420p.
    Mp4,
    /// GIF89a, infinite loop.
    Gif,
    /// Single-frame PNG.
    Png,
}

impl OutputFormat {
    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Gif => "gif",
            Self::Png => "png",
        }
    }

    /// MIME type for transports that need one.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Gif => "image/gif",
            Self::Png => "image/png",
        }
    }
}

/// Encoded bytes plus what a transport needs to label them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputArtifact {
    /// Encoded payload.
    pub bytes: Vec<u8>,
    /// Container family.
    pub container: ContainerKind,
    /// Concrete format inside that family.
    pub format: OutputFormat,
    /// Frame dimensions as composited (video output may be padded to even sizes).
    pub dimensions: Dimensions,
    /// Number of frames written.
    pub frame_count: usize,
}
