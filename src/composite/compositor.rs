use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;

use crate::composite::anchor::SpatialAnchor;
use crate::composite::blend::blend_region;
use crate::media::source::{MediaSource, RgbaFrame, Sequence};
use crate::timeline::window::CompositeWindow;

/// Counters reported by [`composite_with_stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositeStats {
    /// Output frames in the window.
    pub frames_total: u64,
    /// Distinct (base, overlay) pairs actually blended.
    pub frames_blended: u64,
    /// Output frames that reused an earlier blend.
    pub frames_reused: u64,
}

/// Tuning knobs for [`composite_with_stats`].
#[derive(Clone, Copy, Debug)]
pub struct CompositeOpts {
    /// Blend distinct frames on the rayon global pool.
    pub parallel: bool,
}

impl Default for CompositeOpts {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Place the overlay on every output frame of `window`.
///
/// See [`composite_with_stats`].
pub fn composite(
    base: &MediaSource,
    overlay: &Sequence,
    window: &CompositeWindow,
    anchor: SpatialAnchor,
) -> Sequence {
    composite_with_stats(base, overlay, window, anchor, &CompositeOpts::default()).0
}

/// Place the overlay on every output frame of `window` and report how much work was shared.
///
/// Output frame `i` shows the base frame at time `i / window.fps` (the single frame for a still)
/// with overlay frame `floor(i / window.fps * overlay.fps) mod overlay.len()` on top, so the
/// overlay loops from its first frame as often as the window requires. Output frames always have
/// the base's dimensions; overlay pixels that fall outside the base are clipped.
///
/// Slots that resolve to the same (base, overlay) pair share one blended frame.
#[tracing::instrument(level = "debug", skip_all, fields(frames = window.frame_count, fps = %window.fps))]
pub fn composite_with_stats(
    base: &MediaSource,
    overlay: &Sequence,
    window: &CompositeWindow,
    anchor: SpatialAnchor,
    opts: &CompositeOpts,
) -> (Sequence, CompositeStats) {
    let placement = anchor.resolve(base.dimensions(), overlay.dimensions());
    let overlay_len = overlay.len() as u64;

    let mut uniq = Vec::<(usize, usize)>::new();
    let mut map = Vec::<usize>::with_capacity(usize::try_from(window.frame_count).unwrap_or(0));
    let mut seen = HashMap::<(usize, usize), usize>::new();
    for i in 0..window.frame_count {
        let base_idx = base.frame_index_at(i, window.fps);
        let overlay_idx = (overlay.fps().frame_at(i, window.fps) % overlay_len) as usize;
        let u = *seen.entry((base_idx, overlay_idx)).or_insert_with(|| {
            let n = uniq.len();
            uniq.push((base_idx, overlay_idx));
            n
        });
        map.push(u);
    }

    let blend_pair = |&(base_idx, overlay_idx): &(usize, usize)| -> Arc<RgbaFrame> {
        let mut out = RgbaFrame::clone(base_frame(base, base_idx));
        blend_region(&mut out, &overlay.frames()[overlay_idx], placement);
        Arc::new(out)
    };
    let blended: Vec<Arc<RgbaFrame>> = if opts.parallel && uniq.len() > 1 {
        uniq.par_iter().map(blend_pair).collect()
    } else {
        uniq.iter().map(blend_pair).collect()
    };

    let frames: Vec<Arc<RgbaFrame>> = map.iter().map(|&u| Arc::clone(&blended[u])).collect();
    let total = frames.len() as u64;
    let unique = blended.len() as u64;
    tracing::debug!(total, unique, ?placement, "composited overlay");

    (
        Sequence::from_parts(frames, window.fps),
        CompositeStats {
            frames_total: total,
            frames_blended: unique,
            frames_reused: total.saturating_sub(unique),
        },
    )
}

fn base_frame(base: &MediaSource, idx: usize) -> &Arc<RgbaFrame> {
    match base {
        MediaSource::Still(frame) => frame,
        MediaSource::Sequence(seq) => seq.frame_clamped(idx as u64),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/compositor.rs"]
mod tests;
