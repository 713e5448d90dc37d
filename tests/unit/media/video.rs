use super::*;

#[test]
fn classify_truncated_containers() {
    let err = classify_ffmpeg_failure(b"[mov,mp4] moov atom not found\npipe:0: Invalid data found when processing input\n");
    assert_eq!(err, DecodeError::Truncated);
    assert_eq!(
        classify_ffmpeg_failure(b"pipe:0: End of file\n"),
        DecodeError::Truncated
    );
}

#[test]
fn moov_at_end_and_partial_reads_ask_for_seekable_input() {
    assert!(needs_seekable_input(b"[mov,mp4,m4a,3gp,3g2,mj2 @ 0x1] moov atom not found\n"));
    assert!(needs_seekable_input(
        b"[mov,mp4,m4a,3gp,3g2,mj2 @ 0x1] stream 0, offset 0x30: partial file\n"
    ));
    assert!(!needs_seekable_input(b"pipe:0: Invalid data found when processing input\n"));
    assert!(!needs_seekable_input(b""));
}

#[test]
fn classify_foreign_payloads_as_unsupported() {
    let err = classify_ffmpeg_failure(b"pipe:0: Invalid data found when processing input\n");
    assert!(matches!(err, DecodeError::UnsupportedFormat(_)));
}

#[test]
fn classify_other_failures_as_tool_errors() {
    let err = classify_ffmpeg_failure(b"Conversion failed!\n");
    assert!(matches!(err, DecodeError::Tool(_)));
}

#[cfg(feature = "media-ffmpeg")]
#[test]
fn probe_rejects_empty_payload_without_spawning() {
    assert_eq!(probe_video(&[]).unwrap_err(), DecodeError::Truncated);
}

#[cfg(not(feature = "media-ffmpeg"))]
#[test]
fn video_paths_report_missing_feature() {
    assert!(matches!(probe_video(b"x"), Err(DecodeError::Tool(_))));
    assert!(matches!(decode_video(b"x", None), Err(DecodeError::Tool(_))));
}
