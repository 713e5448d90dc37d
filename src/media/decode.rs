use std::io::Cursor;
use std::sync::Arc;

use image::{AnimationDecoder, ImageError, ImageFormat};

use crate::foundation::core::{Fps, Seconds};
use crate::foundation::error::DecodeError;
use crate::foundation::math::gcd_u64;
use crate::media::source::{MediaKind, MediaSource, RgbaFrame, Sequence};

/// Delays at or below this are bumped to [`FALLBACK_DELAY_US`], as browsers do for GIFs.
const MIN_DELAY_US: u64 = 10_000;
const FALLBACK_DELAY_US: u64 = 100_000;

/// Decode `bytes` as `kind`.
///
/// Inputs without an alpha channel are expanded to RGBA with alpha = 255, so every decoded frame
/// carries straight alpha and opaque sources composite as fully opaque.
pub fn decode(bytes: &[u8], kind: MediaKind) -> Result<MediaSource, DecodeError> {
    decode_with_limit(bytes, kind, None)
}

/// Decode `bytes` as `kind`, keeping at most `ceil(limit * fps)` frames of a sequence.
///
/// The kept prefix always spans at least `limit` when the input is longer than that, so capping
/// the timeline afterwards yields exactly `limit`.
pub fn decode_with_limit(
    bytes: &[u8],
    kind: MediaKind,
    limit: Option<Seconds>,
) -> Result<MediaSource, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Truncated);
    }
    match kind {
        MediaKind::Image => decode_still(bytes),
        MediaKind::AnimatedImage => {
            decode_animated(bytes).map(|seq| MediaSource::Sequence(truncate(seq, limit)))
        }
        MediaKind::Video => crate::media::video::decode_video(bytes, limit),
    }
}

fn decode_still(bytes: &[u8]) -> Result<MediaSource, DecodeError> {
    let format = image::guess_format(bytes).map_err(|e| map_image_error(e, bytes))?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| map_image_error(e, bytes))?;
    let frame = RgbaFrame::from_image(img.to_rgba8())?;
    Ok(MediaSource::still(frame))
}

fn decode_animated(bytes: &[u8]) -> Result<Sequence, DecodeError> {
    let format = image::guess_format(bytes).map_err(|e| map_image_error(e, bytes))?;
    let frames = match format {
        ImageFormat::Gif => {
            let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(bytes))
                .map_err(|e| map_image_error(e, bytes))?;
            decoder
                .into_frames()
                .collect_frames()
                .map_err(|e| map_image_error(e, bytes))?
        }
        ImageFormat::Png => {
            let decoder = image::codecs::png::PngDecoder::new(Cursor::new(bytes))
                .map_err(|e| map_image_error(e, bytes))?;
            if !decoder.is_apng().map_err(|e| map_image_error(e, bytes))? {
                return single_frame_sequence(bytes);
            }
            decoder
                .apng()
                .map_err(|e| map_image_error(e, bytes))?
                .into_frames()
                .collect_frames()
                .map_err(|e| map_image_error(e, bytes))?
        }
        ImageFormat::WebP => {
            let decoder = image::codecs::webp::WebPDecoder::new(Cursor::new(bytes))
                .map_err(|e| map_image_error(e, bytes))?;
            if !decoder.has_animation() {
                return single_frame_sequence(bytes);
            }
            decoder
                .into_frames()
                .collect_frames()
                .map_err(|e| map_image_error(e, bytes))?
        }
        other => {
            return Err(DecodeError::unsupported(format!(
                "{other:?} is not an animated image container"
            )));
        }
    };

    let timed = frames
        .into_iter()
        .map(|f| {
            let (num, den) = f.delay().numer_denom_ms();
            let delay_us = if den == 0 {
                0
            } else {
                u64::from(num) * 1000 / u64::from(den)
            };
            Ok((RgbaFrame::from_image(f.into_buffer())?, delay_us))
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;
    retime_to_uniform(timed)
}

/// Static PNG/WebP handed in as an animated image: one frame at the fallback delay.
fn single_frame_sequence(bytes: &[u8]) -> Result<Sequence, DecodeError> {
    let MediaSource::Still(frame) = decode_still(bytes)? else {
        return Err(DecodeError::malformed("still decode produced a sequence"));
    };
    let fps = fps_from_delay_us(FALLBACK_DELAY_US)?;
    Sequence::new(vec![frame], fps)
}

/// Map per-frame delays onto a single frame rate.
///
/// Uniform delays keep their exact rate. Mixed delays are resampled on a grid of the smallest
/// delay, each grid slot showing whichever source frame covers its start time.
pub(crate) fn retime_to_uniform(timed: Vec<(RgbaFrame, u64)>) -> Result<Sequence, DecodeError> {
    if timed.is_empty() {
        return Err(DecodeError::malformed("animated image holds no frames"));
    }
    let delays: Vec<u64> = timed.iter().map(|(_, d)| normalize_delay(*d)).collect();
    let step = delays.iter().copied().min().unwrap_or(FALLBACK_DELAY_US);
    let fps = fps_from_delay_us(step)?;
    let frames: Vec<Arc<RgbaFrame>> = timed.into_iter().map(|(f, _)| Arc::new(f)).collect();

    if delays.iter().all(|&d| d == step) {
        return Sequence::new(frames, fps);
    }

    let total: u64 = delays.iter().sum();
    let slots = total.div_ceil(step);
    let mut out = Vec::with_capacity(slots as usize);
    let mut src = 0usize;
    let mut src_end = delays[0];
    for slot in 0..slots {
        let t = slot * step;
        while t >= src_end && src + 1 < frames.len() {
            src += 1;
            src_end += delays[src];
        }
        out.push(Arc::clone(&frames[src]));
    }
    Sequence::new(out, fps)
}

fn normalize_delay(delay_us: u64) -> u64 {
    if delay_us <= MIN_DELAY_US {
        FALLBACK_DELAY_US
    } else {
        delay_us
    }
}

fn fps_from_delay_us(delay_us: u64) -> Result<Fps, DecodeError> {
    let g = gcd_u64(1_000_000, delay_us).max(1);
    let num = u32::try_from(1_000_000 / g).ok();
    let den = u32::try_from(delay_us / g).ok();
    num.zip(den)
        .and_then(|(num, den)| Fps::new(num, den))
        .ok_or_else(|| DecodeError::invalid_source(format!("unusable frame delay {delay_us}us")))
}

/// Keep only the frames needed to cover `limit`.
pub(crate) fn truncate(mut seq: Sequence, limit: Option<Seconds>) -> Sequence {
    let Some(limit) = limit else {
        return seq;
    };
    let keep = usize::try_from(limit.frames_ceil(seq.fps()).max(1)).unwrap_or(usize::MAX);
    seq.truncate(keep);
    seq
}

fn map_image_error(err: ImageError, bytes: &[u8]) -> DecodeError {
    match err {
        ImageError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            DecodeError::Truncated
        }
        ImageError::Unsupported(e) => {
            // Too short to even carry a signature reads as truncated rather than foreign.
            if bytes.len() < 8 {
                DecodeError::Truncated
            } else {
                DecodeError::unsupported(e.to_string())
            }
        }
        ImageError::Decoding(e) => {
            let msg = e.to_string();
            if mentions_eof(&msg) {
                DecodeError::Truncated
            } else {
                DecodeError::malformed(msg)
            }
        }
        ImageError::Limits(e) => DecodeError::malformed(e.to_string()),
        other => {
            let msg = other.to_string();
            if mentions_eof(&msg) {
                DecodeError::Truncated
            } else {
                DecodeError::malformed(msg)
            }
        }
    }
}

fn mentions_eof(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    lower.contains("eof") || lower.contains("end of file") || lower.contains("unexpected end")
}

#[cfg(test)]
#[path = "../../tests/unit/media/decode.rs"]
mod tests;
