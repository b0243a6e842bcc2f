//! TOML config files: partial files, round trips, validation.

use lipsync::config::WordGranularity;
use lipsync::{LipSyncConfig, LipSyncError, Viseme};

#[test]
fn partial_file_keeps_defaults_for_missing_keys() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[sampler]
poll_interval_ms = 16

[normalizer]
word_granularity = "whole_word"

[assets]
rest = "idle.png"
b = "lips_closed.png"
"#,
    )
    .unwrap();

    let config = LipSyncConfig::from_file(&path).unwrap();
    assert_eq!(config.sampler.poll_interval_ms, 16);
    assert_eq!(config.normalizer.word_granularity, WordGranularity::WholeWord);
    assert_eq!(config.blink.min_interval_ms, 2_000);
    assert_eq!(config.assets.asset_for(Viseme::Rest), "idle.png");
    assert_eq!(config.assets.asset_for(Viseme::B), "lips_closed.png");
    assert_eq!(
        config.assets.asset_for(Viseme::A),
        Viseme::A.default_asset()
    );
    config.validate().unwrap();
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("nested").join("config.toml");
    let mut config = LipSyncConfig::default();
    config.blink.seed = Some(7);
    config.blink.double_blink_probability = 0.5;
    config.save_to_file(&path).unwrap();

    let loaded = LipSyncConfig::from_file(&path).unwrap();
    assert_eq!(loaded.blink.seed, Some(7));
    assert!((loaded.blink.double_blink_probability - 0.5).abs() < f64::EPSILON);
}

#[test]
fn inverted_bounds_fail_validation() {
    let mut config = LipSyncConfig::default();
    config.blink.min_blink_ms = 500;
    config.blink.max_blink_ms = 100;
    assert!(matches!(config.validate(), Err(LipSyncError::Config(_))));
}

#[test]
fn malformed_file_is_a_config_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "sampler = [not toml").unwrap();
    assert!(matches!(
        LipSyncConfig::from_file(&path),
        Err(LipSyncError::Config(_))
    ));
}
