use super::*;
use crate::foundation::core::{Fps, Seconds};
use crate::media::source::RgbaFrame;

fn numbered(n: u8, fps: u32) -> Sequence {
    let frames = (0..n)
        .map(|i| RgbaFrame::filled(1, 1, [i, 0, 0, 255]).unwrap())
        .collect();
    Sequence::from_frames(frames, Fps::integer(fps).unwrap()).unwrap()
}

fn reds(seq: &Sequence) -> Vec<u8> {
    seq.frames().iter().map(|f| f.as_bytes()[0]).collect()
}

#[test]
fn speed_domain_is_inclusive() {
    assert!(SpeedFactor::new(0.1).is_ok());
    assert!(SpeedFactor::new(3.0).is_ok());
    assert_eq!(SpeedFactor::new(5.0), Err(PipelineError::InvalidSpeed(5.0)));
    assert!(SpeedFactor::new(0.09).is_err());
    assert!(SpeedFactor::new(-1.0).is_err());
    assert!(matches!(
        SpeedFactor::new(f64::NAN),
        Err(PipelineError::InvalidSpeed(v)) if v.is_nan()
    ));
}

#[test]
fn speed_deserialize_validates() {
    let ok: SpeedFactor = serde_json::from_str("2.0").unwrap();
    assert_eq!(ok.get(), 2.0);
    assert!(serde_json::from_str::<SpeedFactor>("4.0").is_err());
}

#[test]
fn normal_speed_is_identity() {
    let seq = numbered(6, 10);
    let out = apply(&seq, SpeedFactor::NORMAL);
    assert_eq!(reds(&out), reds(&seq));
    assert_eq!(out.fps(), seq.fps());
}

#[test]
fn double_speed_halves_duration_and_keeps_rate() {
    let seq = numbered(20, 10);
    let out = apply(&seq, SpeedFactor::new(2.0).unwrap());
    assert_eq!(out.fps(), seq.fps());
    assert_eq!(out.len(), 10);
    assert_eq!(out.duration(), Seconds::from_secs(1));
    assert_eq!(reds(&out), vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);
}

#[test]
fn half_speed_holds_each_frame_twice() {
    let seq = numbered(4, 10);
    let out = apply(&seq, SpeedFactor::new(0.5).unwrap());
    assert_eq!(reds(&out), vec![0, 0, 1, 1, 2, 2, 3, 3]);
    // Held frames are shared, not copied.
    assert!(Arc::ptr_eq(&out.frames()[0], &out.frames()[1]));
}

#[test]
fn effective_duration_within_one_frame_of_target() {
    let seq = numbered(17, 12);
    let original = seq.duration().as_secs_f64();
    let frame = 1.0 / 12.0;
    for f in [0.1, 0.3, 0.7, 1.3, 2.2, 3.0] {
        let out = apply(&seq, SpeedFactor::new(f).unwrap());
        let got = out.duration().as_secs_f64();
        assert!(
            (got - original / f).abs() <= frame + 1e-9,
            "speed {f}: got {got}, want {}",
            original / f
        );
        assert_eq!(out.fps(), seq.fps());
    }
}

#[test]
fn single_frame_overlay_never_empties() {
    let seq = numbered(1, 10);
    let out = apply(&seq, SpeedFactor::new(3.0).unwrap());
    assert_eq!(out.len(), 1);
}
