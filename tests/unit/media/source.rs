use super::*;

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> RgbaFrame {
    RgbaFrame::filled(w, h, rgba).unwrap()
}

#[test]
fn media_kind_from_extension_is_case_insensitive() {
    assert_eq!(MediaKind::from_extension("PNG"), Some(MediaKind::Image));
    assert_eq!(MediaKind::from_extension("gif"), Some(MediaKind::AnimatedImage));
    assert_eq!(MediaKind::from_extension("Mp4"), Some(MediaKind::Video));
    assert_eq!(MediaKind::from_extension("txt"), None);
}

#[test]
fn media_kind_parses_cli_names() {
    assert_eq!("animation".parse::<MediaKind>(), Ok(MediaKind::AnimatedImage));
    assert_eq!("photo".parse::<MediaKind>(), Ok(MediaKind::Image));
    assert!("audio".parse::<MediaKind>().is_err());
}

#[test]
fn rgba_frame_rejects_wrong_buffer_len_and_zero_size() {
    assert!(matches!(
        RgbaFrame::new(2, 2, vec![0; 15]),
        Err(DecodeError::InvalidSource(_))
    ));
    assert!(matches!(
        RgbaFrame::new(0, 2, Vec::new()),
        Err(DecodeError::InvalidSource(_))
    ));
    assert!(RgbaFrame::new(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn rgba_frame_pixel_and_image_roundtrip() {
    let f = solid(3, 2, [1, 2, 3, 4]);
    assert_eq!(f.pixel(2, 1), Some([1, 2, 3, 4]));
    assert_eq!(f.pixel(3, 0), None);
    let back = RgbaFrame::from_image(f.to_image()).unwrap();
    assert_eq!(back, f);
}

#[test]
fn sequence_new_enforces_invariants() {
    let fps = Fps::integer(10).unwrap();
    assert!(matches!(
        Sequence::new(Vec::new(), fps),
        Err(DecodeError::InvalidSource(_))
    ));

    let mixed = vec![Arc::new(solid(2, 2, [0; 4])), Arc::new(solid(3, 2, [0; 4]))];
    assert!(matches!(
        Sequence::new(mixed, fps),
        Err(DecodeError::InvalidSource(_))
    ));

    let zero_rate = Fps { num: 0, den: 1 };
    assert!(Sequence::new(vec![Arc::new(solid(1, 1, [0; 4]))], zero_rate).is_err());
}

#[test]
fn sequence_duration_is_len_over_fps() {
    let frames = (0..20).map(|_| solid(1, 1, [0; 4])).collect();
    let seq = Sequence::from_frames(frames, Fps::integer(10).unwrap()).unwrap();
    assert_eq!(seq.len(), 20);
    assert_eq!(seq.duration(), Seconds::from_secs(2));
    assert_eq!(seq.dimensions(), Dimensions::new(1, 1));
}

#[test]
fn sequence_truncate_keeps_at_least_one_frame() {
    let frames = (0..5).map(|_| solid(1, 1, [0; 4])).collect();
    let mut seq = Sequence::from_frames(frames, Fps::integer(5).unwrap()).unwrap();
    seq.truncate(3);
    assert_eq!(seq.len(), 3);
    seq.truncate(0);
    assert_eq!(seq.len(), 1);
}

#[test]
fn still_has_zero_duration_and_one_frame() {
    let src = MediaSource::still(solid(4, 3, [9, 9, 9, 255]));
    assert!(src.duration().is_zero());
    assert_eq!(src.frame_count(), 1);
    assert_eq!(src.dimensions(), Dimensions::new(4, 3));
    assert!(!src.is_sequence());
    let timeline = Fps::integer(30).unwrap();
    assert_eq!(src.frame_index_at(1000, timeline), 0);
}

#[test]
fn sequence_source_samples_by_time_and_clamps() {
    let frames = (0..4u8).map(|i| solid(1, 1, [i, 0, 0, 255])).collect();
    let src = MediaSource::Sequence(
        Sequence::from_frames(frames, Fps::integer(2).unwrap()).unwrap(),
    );
    let timeline = Fps::integer(4).unwrap();
    // 4 fps output over a 2 fps source: each source frame is held twice.
    let idx: Vec<usize> = (0..10).map(|i| src.frame_index_at(i, timeline)).collect();
    assert_eq!(idx, vec![0, 0, 1, 1, 2, 2, 3, 3, 3, 3]);
    assert_eq!(src.frame_at(5, timeline).pixel(0, 0), Some([2, 0, 0, 255]));
}
