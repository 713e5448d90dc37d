use std::io::Cursor;

use super::*;
use crate::encode::artifact::OutputFormat;
use crate::foundation::core::{Dimensions, Fps};
use crate::foundation::error::DecodeError;
use crate::media::source::RgbaFrame;

const BASE_PX: [u8; 4] = [40, 80, 120, 255];

fn overlay_source(frames: u8, fps: u32, size: u32) -> MediaSource {
    let frames = (0..frames)
        .map(|i| RgbaFrame::filled(size, size, [255, i, 0, 255]).unwrap())
        .collect();
    MediaSource::Sequence(Sequence::from_frames(frames, Fps::integer(fps).unwrap()).unwrap())
}

fn engine(frames: u8, fps: u32, size: u32) -> OverlayEngine {
    OverlayEngine::new(overlay_source(frames, fps, size), EngineConfig::default()).unwrap()
}

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn engine_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OverlayEngine>();
}

#[test]
fn still_overlay_is_rejected_at_construction() {
    let still = MediaSource::still(RgbaFrame::filled(2, 2, [0; 4]).unwrap());
    assert!(matches!(
        OverlayEngine::new(still, EngineConfig::default()),
        Err(PipelineError::InvalidOverlay(_))
    ));
    assert!(matches!(
        OverlayEngine::from_overlay_bytes(&[], MediaKind::AnimatedImage, EngineConfig::default()),
        Err(PipelineError::InvalidOverlay(_))
    ));
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let cfg = EngineConfig {
        max_duration_secs: -1.0,
        ..EngineConfig::default()
    };
    assert!(matches!(
        OverlayEngine::new(overlay_source(2, 10, 2), cfg),
        Err(PipelineError::Config(_))
    ));
}

#[test]
fn out_of_range_speed_fails_before_decode() {
    let eng = engine(4, 10, 2);
    let garbage = b"this is not media at all, and must never be decoded";
    let req = OverlayRequest::new(garbage, MediaKind::Video).speed(5.0);
    assert_eq!(eng.run(&req).unwrap_err(), PipelineError::InvalidSpeed(5.0));
}

#[test]
fn empty_base_is_truncated() {
    let eng = engine(4, 10, 2);
    let req = OverlayRequest::new(&[], MediaKind::Image);
    assert_eq!(
        eng.run(&req).unwrap_err(),
        PipelineError::DecodeFailed(DecodeError::Truncated)
    );
}

#[test]
fn non_positive_max_duration_is_invalid_request() {
    let eng = engine(4, 10, 2);
    let bytes = png_bytes(4, 4, BASE_PX);
    for secs in [0.0, -2.0, f64::NAN] {
        let req = OverlayRequest::new(&bytes, MediaKind::Image).max_duration_secs(secs);
        assert!(matches!(
            eng.run(&req),
            Err(PipelineError::InvalidRequest(_))
        ));
    }
}

#[test]
fn video_base_at_double_speed_loops_overlay_five_times() {
    // 2 s @ 10 fps overlay, speed 2 -> 1 s; 5 s @ 24 fps base -> 120 frames.
    let eng = engine(20, 10, 4);
    let base_frames = (0..120)
        .map(|_| RgbaFrame::filled(32, 24, BASE_PX).unwrap())
        .collect();
    let base = MediaSource::Sequence(
        Sequence::from_frames(base_frames, Fps::integer(24).unwrap()).unwrap(),
    );
    let params = OverlayParams {
        speed: 2.0,
        anchor: Some(SpatialAnchor::BottomLeft),
        max_duration_secs: Some(10.0),
        scale: None,
    };
    let out = eng.render(&base, &params).unwrap();

    assert_eq!(out.window.duration, Seconds::from_secs(5));
    assert_eq!(out.window.fps, Fps::integer(24).unwrap());
    assert_eq!(out.window.frame_count, 120);
    assert_eq!(out.frames.len(), 120);
    assert_eq!(out.target, ContainerKind::Video);

    // Overlay frame k (after retiming) carries green = 2k; watch the bottom-left pixel restart.
    let greens: Vec<u8> = out
        .frames
        .frames()
        .iter()
        .map(|f| f.pixel(0, 23).unwrap()[1])
        .collect();
    let starts = greens
        .iter()
        .enumerate()
        .filter(|&(i, &g)| g == 0 && (i == 0 || greens[i - 1] != 0))
        .count();
    assert_eq!(starts, 5);
}

#[test]
fn still_base_plays_overlay_once_and_keeps_base_pixels() {
    let eng = engine(24, 8, 50);
    let base = MediaSource::still(RgbaFrame::filled(800, 600, BASE_PX).unwrap());
    let out = eng.render(&base, &OverlayParams::default()).unwrap();

    assert_eq!(out.window.duration, Seconds::from_secs(3));
    assert_eq!(out.window.frame_count, 24);
    assert_eq!(out.frames.len(), 24);
    assert_eq!(out.frames.fps(), Fps::integer(8).unwrap());
    assert_eq!(out.target, ContainerKind::AnimatedImage);
    assert_eq!(out.stats.frames_blended, 24);

    let placement =
        SpatialAnchor::BottomLeft.resolve(Dimensions::new(800, 600), Dimensions::new(50, 50));
    for frame in out.frames.frames() {
        assert_eq!(frame.dimensions(), Dimensions::new(800, 600));
        for (i, px) in frame.as_bytes().chunks_exact(4).enumerate() {
            let (x, y) = ((i % 800) as u32, (i / 800) as u32);
            if !placement.contains(x, y) {
                assert_eq!(px, &BASE_PX[..], "pixel {x},{y}");
            }
        }
    }
}

#[test]
fn long_sequence_base_is_capped_to_max_duration() {
    let eng = engine(3, 10, 2);
    let frames = (0..40)
        .map(|_| RgbaFrame::filled(8, 8, BASE_PX).unwrap())
        .collect();
    let base =
        MediaSource::Sequence(Sequence::from_frames(frames, Fps::integer(10).unwrap()).unwrap());
    let params = OverlayParams {
        max_duration_secs: Some(1.5),
        ..OverlayParams::default()
    };
    let out = eng.render(&base, &params).unwrap();
    assert_eq!(out.window.duration, Seconds::from_millis(1500));
    assert_eq!(out.frames.len(), 15);
}

#[test]
fn run_on_still_base_produces_looping_gif() {
    let eng = engine(6, 10, 4);
    let bytes = png_bytes(16, 12, BASE_PX);
    let req = OverlayRequest::new(&bytes, MediaKind::Image).anchor(SpatialAnchor::TopRight);
    let art = eng.run(&req).unwrap();

    assert_eq!(art.container, ContainerKind::AnimatedImage);
    assert_eq!(art.format, OutputFormat::Gif);
    assert_eq!(art.frame_count, 6);
    assert_eq!(art.dimensions, Dimensions::new(16, 12));

    let back = decode(&art.bytes, MediaKind::AnimatedImage).unwrap();
    assert_eq!(back.frame_count(), 6);
    assert_eq!(back.dimensions(), Dimensions::new(16, 12));
}

#[test]
fn single_frame_window_produces_png() {
    let eng = engine(1, 10, 2);
    let bytes = png_bytes(6, 6, BASE_PX);
    let art = eng
        .run(&OverlayRequest::new(&bytes, MediaKind::Image))
        .unwrap();
    assert_eq!(art.format, OutputFormat::Png);
    assert_eq!(art.frame_count, 1);

    let MediaSource::Still(frame) = decode(&art.bytes, MediaKind::Image).unwrap() else {
        panic!("png should decode as a still");
    };
    assert_eq!(frame.pixel(0, 5), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(5, 0), Some(BASE_PX));
}

#[test]
fn scale_override_resizes_overlay_per_request() {
    let eng = engine(2, 10, 40);
    let base = MediaSource::still(RgbaFrame::filled(100, 60, BASE_PX).unwrap());
    let params = OverlayParams {
        scale: Some(OverlayScale::FitShortSide(0.5)),
        anchor: Some(SpatialAnchor::TopLeft),
        ..OverlayParams::default()
    };
    let out = eng.render(&base, &params).unwrap();
    let frame = &out.frames.frames()[0];
    // 60 * 0.5 = 30 px overlay.
    assert_eq!(frame.pixel(29, 29), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(30, 0), Some(BASE_PX));
    // The engine's overlay itself is unchanged.
    assert_eq!(eng.overlay().dimensions(), Dimensions::new(40, 40));
}

#[test]
fn huge_scale_factor_is_bounded_by_base() {
    let eng = engine(2, 10, 2);
    let bytes = png_bytes(8, 8, BASE_PX);
    let req = OverlayRequest::new(&bytes, MediaKind::Image)
        .anchor(SpatialAnchor::TopLeft)
        .scale(OverlayScale::Factor(1.0e9));
    let art = eng.run(&req).unwrap();
    assert_eq!(art.dimensions, Dimensions::new(8, 8));

    let back = decode(&art.bytes, MediaKind::AnimatedImage).unwrap();
    let MediaSource::Sequence(seq) = back else {
        panic!("expected an animated result");
    };
    // The overlay now covers the whole base.
    let px = seq.frames()[0].pixel(7, 7).unwrap();
    assert!(px[0] > 200 && px[2] < 60, "{px:?}");
}
