use super::*;
use crate::media::source::RgbaFrame;

fn seq(frames: usize, fps: u32) -> Sequence {
    let frames = (0..frames)
        .map(|_| RgbaFrame::filled(2, 2, [0, 0, 0, 255]).unwrap())
        .collect();
    Sequence::from_frames(frames, Fps::integer(fps).unwrap()).unwrap()
}

#[test]
fn sequence_base_uses_base_rate_and_duration() {
    let base = MediaSource::Sequence(seq(120, 24));
    let overlay = seq(10, 10);
    let w = normalize(&base, &overlay, Seconds::from_secs(10));
    assert_eq!(w.duration, Seconds::from_secs(5));
    assert_eq!(w.fps, Fps::integer(24).unwrap());
    assert_eq!(w.frame_count, 120);
}

#[test]
fn long_sequence_base_is_capped_exactly() {
    let base = MediaSource::Sequence(seq(30 * 25, 25));
    let overlay = seq(10, 10);
    let w = normalize(&base, &overlay, Seconds::from_secs(10));
    assert_eq!(w.duration, Seconds::from_secs(10));
    assert_eq!(w.frame_count, 250);
}

#[test]
fn still_base_takes_overlay_timeline_uncapped() {
    let base = MediaSource::still(RgbaFrame::filled(8, 6, [0, 0, 0, 255]).unwrap());
    let overlay = seq(24, 8);
    let w = normalize(&base, &overlay, Seconds::from_secs(1));
    assert_eq!(w.duration, Seconds::from_secs(3));
    assert_eq!(w.fps, Fps::integer(8).unwrap());
    assert_eq!(w.frame_count, 24);
}

#[test]
fn single_frame_sequence_base_gives_single_frame_window() {
    let base = MediaSource::Sequence(seq(1, 10));
    let w = normalize(&base, &seq(5, 10), Seconds::from_secs(10));
    assert_eq!(w.frame_count, 1);
    assert!(w.is_single_frame());
}

#[test]
fn window_frame_count_is_at_least_one() {
    let w = CompositeWindow::new(Seconds::ZERO, Fps::integer(30).unwrap());
    assert_eq!(w.frame_count, 1);
    let w = CompositeWindow::new(Seconds::from_millis(1001), Fps::integer(1).unwrap());
    assert_eq!(w.frame_count, 2);
}
