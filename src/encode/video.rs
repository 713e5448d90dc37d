use std::sync::Arc;

use crate::foundation::core::{Dimensions, Fps};
use crate::foundation::error::EncodeError;
use crate::foundation::math::mul_div255_u16;
use crate::media::source::RgbaFrame;

/// Even-sized canvas the video encoder writes (yuv420p needs even width and height).
#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
pub(crate) fn padded_dimensions(dims: Dimensions) -> Dimensions {
    let even = |v: u32| v.saturating_add(v & 1);
    Dimensions::new(even(dims.width), even(dims.height))
}

/// Flatten a straight-alpha frame over an opaque `bg_rgba` into `dst`, a `padded`-sized buffer.
///
/// Rows and columns added by padding are filled with the background.
#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
pub(crate) fn flatten_over_bg_padded(
    dst: &mut [u8],
    padded: Dimensions,
    frame: &RgbaFrame,
    bg_rgba: [u8; 4],
) -> Result<(), EncodeError> {
    let expected = padded
        .rgba8_len()
        .ok_or_else(|| EncodeError::codec("padded frame size overflow"))?;
    if dst.len() != expected || frame.width() > padded.width || frame.height() > padded.height {
        return Err(EncodeError::codec(format!(
            "flatten target {padded} does not fit frame {}",
            frame.dimensions()
        )));
    }

    let bg = [bg_rgba[0], bg_rgba[1], bg_rgba[2], 255];
    let dst_stride = padded.width as usize * 4;
    let src_stride = frame.width() as usize * 4;
    let src = frame.as_bytes();

    for (y, d_row) in dst.chunks_exact_mut(dst_stride).enumerate() {
        if y >= frame.height() as usize {
            for px in d_row.chunks_exact_mut(4) {
                px.copy_from_slice(&bg);
            }
            continue;
        }
        let (d_img, d_pad) = d_row.split_at_mut(src_stride);
        let s_row = &src[y * src_stride..(y + 1) * src_stride];
        for (d, s) in d_img.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
            let a = u16::from(s[3]);
            if a == 255 {
                d.copy_from_slice(s);
                continue;
            }
            let inv = 255u16 - a;
            for i in 0..3 {
                let v = mul_div255_u16(u16::from(s[i]), a) + mul_div255_u16(u16::from(bg[i]), inv);
                d[i] = v.min(255) as u8;
            }
            d[3] = 255;
        }
        for px in d_pad.chunks_exact_mut(4) {
            px.copy_from_slice(&bg);
        }
    }
    Ok(())
}

/// Encode frames to fragmented MP4 (H.264, yuv420p) by streaming raw RGBA through `ffmpeg`.
///
/// The MP4 is written to ffmpeg's stdout; fragmenting lets the muxer finish without seeking.
#[cfg(feature = "media-ffmpeg")]
pub(crate) fn encode_mp4(
    frames: &[Arc<RgbaFrame>],
    fps: Fps,
    bg_rgba: [u8; 4],
    crf: u8,
) -> Result<Vec<u8>, EncodeError> {
    use std::process::Command;

    let first = frames.first().ok_or(EncodeError::EmptySequence)?;
    let padded = padded_dimensions(first.dimensions());
    let frame_len = padded
        .rgba8_len()
        .ok_or_else(|| EncodeError::codec("video frame size overflow"))?;

    let mut cmd = Command::new("ffmpeg");
    cmd.args([
        "-v",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
        &format!("{}x{}", padded.width, padded.height),
        "-r",
        &format!("{}/{}", fps.num, fps.den),
        "-i",
        "pipe:0",
        "-an",
        "-c:v",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-crf",
        &crf.to_string(),
        "-movflags",
        "frag_keyframe+empty_moov",
        "-f",
        "mp4",
        "pipe:1",
    ]);

    let out = crate::ffmpeg::run_piped(&mut cmd, |stdin| {
        use std::io::Write as _;
        let mut scratch = vec![0u8; frame_len];
        for frame in frames {
            flatten_over_bg_padded(&mut scratch, padded, frame, bg_rgba)
                .map_err(std::io::Error::other)?;
            stdin.write_all(&scratch)?;
        }
        Ok(())
    })
    .map_err(|e| {
        EncodeError::tool(format!(
            "failed to run ffmpeg (is it installed and on PATH?): {e}"
        ))
    })?;

    if !out.status.success() {
        return Err(EncodeError::tool(format!(
            "ffmpeg exited with status {}: {}",
            out.status,
            crate::ffmpeg::stderr_summary(&out.stderr)
        )));
    }
    if out.stdout.is_empty() {
        return Err(EncodeError::tool("ffmpeg produced no output"));
    }
    Ok(out.stdout)
}

#[cfg(not(feature = "media-ffmpeg"))]
pub(crate) fn encode_mp4(
    _frames: &[Arc<RgbaFrame>],
    _fps: Fps,
    _bg_rgba: [u8; 4],
    _crf: u8,
) -> Result<Vec<u8>, EncodeError> {
    Err(EncodeError::tool(
        "video output requires the 'media-ffmpeg' feature",
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/video.rs"]
mod tests;
