use super::*;

#[test]
fn padded_dimensions_round_up_to_even() {
    assert_eq!(padded_dimensions(Dimensions::new(4, 6)), Dimensions::new(4, 6));
    assert_eq!(padded_dimensions(Dimensions::new(5, 3)), Dimensions::new(6, 4));
}

#[test]
fn flatten_alpha_0_returns_bg() {
    let frame = RgbaFrame::new(1, 1, vec![200, 200, 200, 0]).unwrap();
    let padded = Dimensions::new(1, 1);
    let mut dst = vec![0u8; 4];
    flatten_over_bg_padded(&mut dst, padded, &frame, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_alpha_255_is_identity() {
    let frame = RgbaFrame::new(1, 1, vec![1, 2, 3, 255]).unwrap();
    let mut dst = vec![0u8; 4];
    flatten_over_bg_padded(&mut dst, Dimensions::new(1, 1), &frame, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![1, 2, 3, 255]);
}

#[test]
fn flatten_half_alpha_mixes_with_bg() {
    let frame = RgbaFrame::new(1, 1, vec![255, 255, 255, 128]).unwrap();
    let mut dst = vec![0u8; 4];
    flatten_over_bg_padded(&mut dst, Dimensions::new(1, 1), &frame, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128, 128, 128, 255]);
}

#[test]
fn flatten_fills_padding_with_bg() {
    let frame = RgbaFrame::filled(3, 1, [9, 9, 9, 255]).unwrap();
    let padded = padded_dimensions(frame.dimensions());
    let mut dst = vec![0u8; padded.rgba8_len().unwrap()];
    flatten_over_bg_padded(&mut dst, padded, &frame, [1, 2, 3, 255]).unwrap();

    let px = |x: usize, y: usize| {
        let i = (y * padded.width as usize + x) * 4;
        [dst[i], dst[i + 1], dst[i + 2], dst[i + 3]]
    };
    assert_eq!(px(0, 0), [9, 9, 9, 255]);
    assert_eq!(px(2, 0), [9, 9, 9, 255]);
    assert_eq!(px(3, 0), [1, 2, 3, 255]);
    assert_eq!(px(0, 1), [1, 2, 3, 255]);
    assert_eq!(px(3, 1), [1, 2, 3, 255]);
}

#[test]
fn flatten_rejects_undersized_target() {
    let frame = RgbaFrame::filled(4, 4, [0; 4]).unwrap();
    let mut dst = vec![0u8; 16];
    assert!(flatten_over_bg_padded(&mut dst, Dimensions::new(2, 2), &frame, [0, 0, 0, 255]).is_err());
}
