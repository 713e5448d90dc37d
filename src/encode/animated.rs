use std::io::Cursor;
use std::sync::Arc;

use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::png::PngEncoder;
use image::{Delay, ExtendedColorType, Frame, ImageEncoder};

use crate::foundation::core::Fps;
use crate::foundation::error::EncodeError;
use crate::media::source::RgbaFrame;

/// NeuQuant sampling factor: 1 is slowest/best, 30 fastest. 10 is what the gif crate recommends.
const GIF_QUANTIZE_SPEED: i32 = 10;

/// Encode a single frame as PNG.
pub(crate) fn encode_png(frame: &RgbaFrame) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            frame.as_bytes(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EncodeError::codec(format!("png encode failed: {e}")))?;
    Ok(out)
}

/// Encode frames as an infinitely looping GIF, each shown for `1 / fps`.
pub(crate) fn encode_gif(frames: &[Arc<RgbaFrame>], fps: Fps) -> Result<Vec<u8>, EncodeError> {
    let delay = Delay::from_numer_denom_ms(fps.den.saturating_mul(1000), fps.num);
    let mut out = Cursor::new(Vec::new());
    {
        let mut encoder = GifEncoder::new_with_speed(&mut out, GIF_QUANTIZE_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| EncodeError::codec(format!("gif repeat setup failed: {e}")))?;
        for (idx, frame) in frames.iter().enumerate() {
            encoder
                .encode_frame(Frame::from_parts(frame.to_image(), 0, 0, delay))
                .map_err(|e| EncodeError::codec(format!("gif frame {idx} encode failed: {e}")))?;
        }
    }
    Ok(out.into_inner())
}
