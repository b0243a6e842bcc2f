//! End-to-end normalization and resolution scenarios through the public API.

use crate::helpers::ma_payload;
use lipsync::alignment::estimate::estimated_duration;
use lipsync::config::{NormalizerConfig, WordGranularity};
use lipsync::{AlignmentSource, Normalizer, Viseme, VisemeTimeline, classify, resolve};
use serde_json::json;

#[test]
fn phoneme_payload_resolves_by_time() {
    let timeline = Normalizer::default().normalize(&ma_payload(), "ma");
    assert_eq!(resolve(&timeline, 0.1), Viseme::B);
    assert_eq!(resolve(&timeline, 0.3), Viseme::A);
    assert_eq!(resolve(&timeline, 0.6), Viseme::Rest);
}

#[test]
fn character_payload_without_end_times_gets_derived_ends() {
    let payload = json!({
        "characters": ["h", "i"],
        "character_start_times_seconds": [0.0, 0.1]
    });
    let timeline = Normalizer::default().normalize(&payload, "hi");
    assert_eq!(timeline.len(), 2);
    let last = timeline.segments()[1];
    assert!(last.end_time.is_finite());
    assert!(last.end_time > last.start_time);
}

#[test]
fn nested_alignment_object_is_unwrapped() {
    let payload = json!({
        "audio_base64": "ignored",
        "alignment": {
            "characters": ["o", "k"],
            "character_start_times_seconds": [0.0, 0.2],
            "character_end_times_seconds": [0.2, 0.4]
        }
    });
    assert_eq!(AlignmentSource::parse(&payload).kind(), "character");
    let timeline = Normalizer::default().normalize(&payload, "ok");
    assert_eq!(resolve(&timeline, 0.1), Viseme::O);
    assert_eq!(resolve(&timeline, 0.3), Viseme::G);
}

#[test]
fn matching_character_units_give_one_segment_each() {
    let chars: Vec<String> = "hello world".chars().map(String::from).collect();
    let starts: Vec<f64> = (0..chars.len()).map(|i| i as f64 * 0.07).collect();
    let payload = json!({
        "characters": chars,
        "character_start_times_seconds": starts
    });
    let timeline = Normalizer::default().normalize(&payload, "");
    assert_eq!(timeline.len(), chars.len());
    assert!(timeline.segments().iter().all(|s| s.end_time >= s.start_time));
}

#[test]
fn mismatched_arrays_truncate_to_shortest() {
    let payload = json!({
        "characters": ["a", "b", "c", "d", "e"],
        "character_start_times_seconds": [0.0, 0.1]
    });
    let timeline = Normalizer::default().normalize(&payload, "abcde");
    assert_eq!(timeline.len(), 2);
}

#[test]
fn unrecognized_payload_is_estimated_from_text() {
    let config = NormalizerConfig::default();
    let timeline = Normalizer::new(config.clone()).normalize(&json!({}), "hi");
    let total = estimated_duration("hi", &config);
    assert!(timeline.len() >= 5);
    assert!(
        timeline
            .segments()
            .iter()
            .all(|s| s.start_time >= 0.0 && s.end_time <= total + 1e-9)
    );
}

#[test]
fn garbage_json_string_is_not_an_error() {
    let normalizer = Normalizer::default();
    assert!(normalizer.normalize_str("not json at all", "").is_empty());
    assert!(!normalizer.normalize_str("{\"oops\": 1", "hello").is_empty());
}

#[test]
fn word_payload_follows_configured_granularity() {
    let payload = json!({
        "words": [
            {"word": "map", "start": 0.0, "duration": 0.3},
            {"word": "go", "start": 0.3, "duration": 0.2}
        ]
    });
    let per_char = Normalizer::default().normalize(&payload, "map go");
    assert_eq!(resolve(&per_char, 0.05), Viseme::B);
    assert_eq!(resolve(&per_char, 0.15), Viseme::A);

    let whole = Normalizer::new(NormalizerConfig {
        word_granularity: WordGranularity::WholeWord,
        ..NormalizerConfig::default()
    })
    .normalize(&payload, "map go");
    assert_eq!(resolve(&whole, 0.05), Viseme::A);
    assert_eq!(resolve(&whole, 0.4), Viseme::O);
}

#[test]
fn resolve_is_pure_and_total() {
    let timeline = Normalizer::default().normalize(&ma_payload(), "ma");
    for i in 0..200 {
        let t = f64::from(i) * 0.005 - 0.1;
        assert_eq!(timeline.resolve(t), timeline.resolve(t));
    }
    for t in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -1.0, 1e9] {
        assert_eq!(VisemeTimeline::empty().resolve(t), Viseme::Rest);
    }
}

#[test]
fn classify_never_fails() {
    for symbol in ["", " ", "ˈæ", "AH0", "zzz9", "🙂", "sil", "\u{301}"] {
        let viseme = classify(symbol);
        assert!(Viseme::ALL.contains(&viseme));
    }
}
