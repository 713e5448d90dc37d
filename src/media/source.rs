use std::sync::Arc;

use crate::foundation::core::{Dimensions, Fps, Seconds};
use crate::foundation::error::DecodeError;

/// Media kind declared by the transport layer for an input payload.
///
/// The engine never re-derives this from file names or MIME strings; the transport resolves it
/// once (see [`MediaKind::from_extension`]) and passes it alongside the bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    /// Still image (PNG, JPEG, BMP, WebP, ...). Decodes to [`MediaSource::Still`].
    Image,
    /// Compressed video container. Decodes to [`MediaSource::Sequence`] through `ffmpeg`.
    Video,
    /// Animated image (GIF, APNG, animated WebP). Decodes to [`MediaSource::Sequence`].
    AnimatedImage,
}

impl MediaKind {
    /// Classify by file extension, mirroring how chat transports label uploads.
    ///
    /// Returns `None` for extensions this crate has no decoder for.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "bmp" | "tif" | "tiff" | "ico" | "tga" | "qoi" => {
                Some(Self::Image)
            }
            "gif" | "apng" | "webp" => Some(Self::AnimatedImage),
            "mp4" | "m4v" | "mov" | "webm" | "mkv" | "avi" => Some(Self::Video),
            _ => None,
        }
    }

    /// Kebab-case name used in logs and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::AnimatedImage => "animated-image",
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" | "photo" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "animated-image" | "animation" | "gif" => Ok(Self::AnimatedImage),
            other => Err(format!(
                "unknown media kind '{other}' (expected image, video or animated-image)"
            )),
        }
    }
}

/// A decoded raster frame: tightly packed, row-major RGBA8 with straight (non-premultiplied) alpha.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbaFrame {
    /// Wrap an RGBA8 buffer, checking that it matches `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DecodeError> {
        let dims = Dimensions::new(width, height);
        if dims.is_empty() {
            return Err(DecodeError::invalid_source(format!(
                "frame dimensions must be non-zero, got {dims}"
            )));
        }
        let expected = dims.rgba8_len().ok_or_else(|| {
            DecodeError::invalid_source(format!("frame buffer size overflow for {dims}"))
        })?;
        if data.len() != expected {
            return Err(DecodeError::invalid_source(format!(
                "frame buffer has {} bytes, expected {expected} for {dims}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Frame filled with a single straight-alpha RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, DecodeError> {
        let len = Dimensions::new(width, height)
            .rgba8_len()
            .ok_or_else(|| DecodeError::invalid_source("frame buffer size overflow"))?;
        Self::new(width, height, rgba.repeat(len / 4))
    }

    /// Take ownership of an `image` buffer.
    pub fn from_image(img: image::RgbaImage) -> Result<Self, DecodeError> {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    /// Copy into an `image` buffer.
    pub fn to_image(&self) -> image::RgbaImage {
        // Dimensions and length are checked on construction.
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width and height.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Raw RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// RGBA value at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }
}

/// Ordered frames sharing one size, played back at a nominal rate.
///
/// Invariants: at least one frame, every frame has the same dimensions, `fps` is non-zero.
/// Frames are reference-counted so retiming can repeat a frame without copying pixels.
#[derive(Clone, Debug)]
pub struct Sequence {
    frames: Vec<Arc<RgbaFrame>>,
    fps: Fps,
}

impl Sequence {
    /// Build a validated sequence.
    pub fn new(frames: Vec<Arc<RgbaFrame>>, fps: Fps) -> Result<Self, DecodeError> {
        if fps.num == 0 || fps.den == 0 {
            return Err(DecodeError::invalid_source("sequence frame rate must be > 0"));
        }
        let first = frames
            .first()
            .ok_or_else(|| DecodeError::invalid_source("sequence must hold at least one frame"))?
            .dimensions();
        if let Some((idx, f)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.dimensions() != first)
        {
            return Err(DecodeError::invalid_source(format!(
                "sequence frame {idx} is {}, expected {first}",
                f.dimensions()
            )));
        }
        Ok(Self { frames, fps })
    }

    /// Assemble frames the caller already knows satisfy the invariants.
    pub(crate) fn from_parts(frames: Vec<Arc<RgbaFrame>>, fps: Fps) -> Self {
        debug_assert!(!frames.is_empty());
        debug_assert!(fps.num > 0 && fps.den > 0);
        Self { frames, fps }
    }

    /// Same rate, frames drawn from this sequence.
    pub(crate) fn with_frames(&self, frames: Vec<Arc<RgbaFrame>>) -> Self {
        Self::from_parts(frames, self.fps)
    }

    /// Convenience constructor from owned frames.
    pub fn from_frames(frames: Vec<RgbaFrame>, fps: Fps) -> Result<Self, DecodeError> {
        Self::new(frames.into_iter().map(Arc::new).collect(), fps)
    }

    /// Nominal frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Number of frames (always ≥ 1).
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false`; present for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// `frame_count / fps`, exact.
    pub fn duration(&self) -> Seconds {
        Seconds::from_frames(self.frames.len() as u64, self.fps)
    }

    /// Shared dimensions of every frame.
    pub fn dimensions(&self) -> Dimensions {
        self.frames[0].dimensions()
    }

    /// All frames in display order.
    pub fn frames(&self) -> &[Arc<RgbaFrame>] {
        &self.frames
    }

    /// Frame at `idx`, clamped to the last frame.
    pub fn frame_clamped(&self, idx: u64) -> &Arc<RgbaFrame> {
        let last = self.frames.len() - 1;
        let idx = usize::try_from(idx).unwrap_or(usize::MAX).min(last);
        &self.frames[idx]
    }

    /// Drop frames past `keep`, never going below one frame.
    pub(crate) fn truncate(&mut self, keep: usize) {
        self.frames.truncate(keep.max(1));
    }

    /// Release the frames.
    pub fn into_frames(self) -> Vec<Arc<RgbaFrame>> {
        self.frames
    }
}

/// A decoded input: either one still frame or a timed frame sequence.
#[derive(Clone, Debug)]
pub enum MediaSource {
    /// Single frame with no intrinsic duration.
    Still(Arc<RgbaFrame>),
    /// Time-varying frames.
    Sequence(Sequence),
}

impl MediaSource {
    /// Wrap a still frame.
    pub fn still(frame: RgbaFrame) -> Self {
        Self::Still(Arc::new(frame))
    }

    /// Intrinsic duration: zero for stills.
    pub fn duration(&self) -> Seconds {
        match self {
            Self::Still(_) => Seconds::ZERO,
            Self::Sequence(seq) => seq.duration(),
        }
    }

    /// Pixel dimensions.
    pub fn dimensions(&self) -> Dimensions {
        match self {
            Self::Still(frame) => frame.dimensions(),
            Self::Sequence(seq) => seq.dimensions(),
        }
    }

    /// Number of decoded frames.
    pub fn frame_count(&self) -> usize {
        match self {
            Self::Still(_) => 1,
            Self::Sequence(seq) => seq.len(),
        }
    }

    /// Return `true` for [`MediaSource::Sequence`].
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// Borrow the sequence, if this is one.
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Still(_) => None,
            Self::Sequence(seq) => Some(seq),
        }
    }

    /// Frame shown at output frame `frame` of a timeline running at `timeline` fps.
    ///
    /// Stills always return their frame; sequences clamp to their last frame.
    pub fn frame_at(&self, frame: u64, timeline: Fps) -> &Arc<RgbaFrame> {
        match self {
            Self::Still(f) => f,
            Self::Sequence(seq) => seq.frame_clamped(seq.fps().frame_at(frame, timeline)),
        }
    }

    /// Index into [`MediaSource::frame_at`]'s backing storage (0 for stills).
    pub(crate) fn frame_index_at(&self, frame: u64, timeline: Fps) -> usize {
        match self {
            Self::Still(_) => 0,
            Self::Sequence(seq) => {
                let idx = seq.fps().frame_at(frame, timeline);
                usize::try_from(idx).unwrap_or(usize::MAX).min(seq.len() - 1)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/source.rs"]
mod tests;
