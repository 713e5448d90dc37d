use crate::foundation::core::{Fps, Seconds};
use crate::media::source::{MediaSource, Sequence};

/// Output timeline shared by every composited frame. Holds no media.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositeWindow {
    /// Output duration.
    pub duration: Seconds,
    /// Output frame rate.
    pub fps: Fps,
    /// `max(1, ceil(duration * fps))`.
    pub frame_count: u64,
}

impl CompositeWindow {
    /// Build a window, deriving the frame count.
    pub fn new(duration: Seconds, fps: Fps) -> Self {
        Self {
            duration,
            fps,
            frame_count: duration.frames_ceil(fps).max(1),
        }
    }

    /// Return `true` when the window covers a single frame.
    pub fn is_single_frame(&self) -> bool {
        self.frame_count == 1
    }
}

/// Reconcile `base` and the (already speed-adjusted) `overlay` onto one output timeline.
///
/// - Sequence base: `min(base.duration, max_duration)` at the base's frame rate.
/// - Still base: the overlay's duration at the overlay's frame rate. Stills have no duration of
///   their own, so the overlay decides how long the result plays; `max_duration` does not apply.
pub fn normalize(base: &MediaSource, overlay: &Sequence, max_duration: Seconds) -> CompositeWindow {
    match base {
        MediaSource::Sequence(seq) => {
            CompositeWindow::new(seq.duration().min(max_duration), seq.fps())
        }
        MediaSource::Still(_) => CompositeWindow::new(overlay.duration(), overlay.fps()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/window.rs"]
mod tests;
