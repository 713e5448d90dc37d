use super::*;

#[test]
fn defaults_match_documented_values() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.max_duration_secs, 10.0);
    assert_eq!(cfg.anchor, SpatialAnchor::BottomLeft);
    assert_eq!(cfg.overlay_scale, OverlayScale::Native);
    assert_eq!(cfg.background_rgba, [0, 0, 0, 255]);
    assert!(cfg.parallel_composite);
    assert_eq!(cfg.video_crf, 23);
    assert_eq!(cfg.max_duration(), Seconds::from_secs(10));
    cfg.validate().unwrap();
}

#[test]
fn json_fills_missing_fields_with_defaults() {
    let cfg = EngineConfig::from_json_str(
        r#"{ "max_duration_secs": 4.5, "anchor": "top-right", "overlay_scale": { "fit-short-side": 0.5 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.max_duration(), Seconds::from_millis(4500));
    assert_eq!(cfg.anchor, SpatialAnchor::TopRight);
    assert_eq!(cfg.overlay_scale, OverlayScale::FitShortSide(0.5));
    assert_eq!(cfg.video_crf, 23);
}

#[test]
fn custom_anchor_in_json() {
    let cfg = EngineConfig::from_json_str(r#"{ "anchor": { "custom": { "x": 5, "y": 7 } } }"#)
        .unwrap();
    assert_eq!(cfg.anchor, SpatialAnchor::Custom { x: 5, y: 7 });
}

#[test]
fn invalid_values_are_config_errors() {
    for json in [
        r#"{ "max_duration_secs": 0 }"#,
        r#"{ "max_duration_secs": -3 }"#,
        r#"{ "max_duration_secs": 0.0001 }"#,
        r#"{ "video_crf": 60 }"#,
        r#"{ "overlay_scale": { "factor": 0.0 } }"#,
        r#"{ "unknown_field": true }"#,
        r#"not json"#,
    ] {
        assert!(
            matches!(EngineConfig::from_json_str(json), Err(PipelineError::Config(_))),
            "{json}"
        );
    }
}

#[test]
fn encode_opts_follow_config() {
    let cfg = EngineConfig {
        background_rgba: [1, 2, 3, 255],
        video_crf: 18,
        ..EngineConfig::default()
    };
    assert_eq!(
        cfg.encode_opts(),
        EncodeOpts {
            background_rgba: [1, 2, 3, 255],
            video_crf: 18,
        }
    );
}
