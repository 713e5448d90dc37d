use std::collections::HashMap;
use std::sync::Arc;

use image::imageops::{self, FilterType};

use crate::composite::blend::{premultiply_in_place, unpremultiply_in_place};
use crate::foundation::core::Dimensions;
use crate::media::source::{RgbaFrame, Sequence};

/// How the overlay is sized relative to the base before compositing.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayScale {
    /// Keep the overlay's decoded size.
    #[default]
    Native,
    /// Multiply both sides by a factor.
    Factor(f32),
    /// Fit inside a square whose side is this fraction of the base's shorter side.
    FitShortSide(f32),
}

impl OverlayScale {
    /// Reject non-finite or non-positive parameters.
    pub fn validate(self) -> Result<(), String> {
        match self {
            Self::Native => Ok(()),
            Self::Factor(v) | Self::FitShortSide(v) => {
                if v.is_finite() && v > 0.0 {
                    Ok(())
                } else {
                    Err(format!("overlay scale must be finite and > 0, got {v}"))
                }
            }
        }
    }

    /// Target overlay size for a given base. Never smaller than 1x1.
    ///
    /// Upscaling stops once the overlay reaches the base's edges. An overlay already larger than
    /// the base is never enlarged.
    pub fn target(self, overlay: Dimensions, base: Dimensions) -> Dimensions {
        if overlay.is_empty() {
            return overlay;
        }
        let requested = match self {
            Self::Native => return overlay,
            Self::Factor(f) => f64::from(f),
            Self::FitShortSide(fraction) => {
                let box_side = f64::from(base.width.min(base.height)) * f64::from(fraction);
                let long_side = f64::from(overlay.width.max(overlay.height));
                box_side / long_side
            }
        };
        let fit = (f64::from(base.width) / f64::from(overlay.width))
            .min(f64::from(base.height) / f64::from(overlay.height))
            .max(1.0);
        let factor = requested.min(fit);
        let scale = |v: u32| ((f64::from(v) * factor).round().max(1.0)).min(f64::from(u32::MAX)) as u32;
        Dimensions::new(scale(overlay.width), scale(overlay.height))
    }
}

impl std::str::FromStr for OverlayScale {
    type Err = String;

    /// Accepts `native`, `factor:<f>` (or `<f>x`) and `fit-short-side:<fraction>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "native" {
            return Ok(Self::Native);
        }
        let parse = |v: &str| {
            v.trim()
                .parse::<f32>()
                .map_err(|e| format!("invalid scale value '{v}': {e}"))
        };
        let scale = if let Some(v) = s.strip_prefix("factor:") {
            Self::Factor(parse(v)?)
        } else if let Some(v) = s.strip_suffix('x') {
            Self::Factor(parse(v)?)
        } else if let Some(v) = s.strip_prefix("fit-short-side:") {
            Self::FitShortSide(parse(v)?)
        } else {
            return Err(format!(
                "unknown overlay scale '{s}' (expected native, factor:<f> or fit-short-side:<f>)"
            ));
        };
        scale.validate()?;
        Ok(scale)
    }
}

/// Resize every frame of `seq` to `target`.
///
/// Frames shared between slots are resized once. Resampling happens in premultiplied space so
/// transparent edges do not bleed their hidden color.
pub fn scale_sequence(seq: &Sequence, target: Dimensions) -> Sequence {
    if seq.dimensions() == target || target.is_empty() {
        return seq.clone();
    }

    let mut resized: HashMap<*const RgbaFrame, Arc<RgbaFrame>> = HashMap::new();
    let frames = seq
        .frames()
        .iter()
        .map(|f| {
            Arc::clone(
                resized
                    .entry(Arc::as_ptr(f))
                    .or_insert_with(|| Arc::new(resize_frame(f, target))),
            )
        })
        .collect();
    seq.with_frames(frames)
}

fn resize_frame(frame: &RgbaFrame, target: Dimensions) -> RgbaFrame {
    let mut src = frame.to_image();
    premultiply_in_place(&mut src);
    let mut out = imageops::resize(&src, target.width, target.height, FilterType::Triangle);
    unpremultiply_in_place(&mut out);
    match RgbaFrame::from_image(out) {
        Ok(f) => f,
        // `target` is non-empty and `resize` returns exactly that size.
        Err(_) => frame.clone(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/scale.rs"]
mod tests;
