//! Session lifecycle through the engine facade, on paused tokio time.

use crate::helpers::{drain, engine, ma_payload, visemes_of};
use lipsync::{EndReason, LipSyncEvent, ManualClock, Viseme};
use std::sync::Arc;
use std::time::Duration;

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn sampler_follows_the_playhead() {
    let (mut engine, mut rx) = engine(false);
    let clock = ManualClock::new();
    clock.play_from(0.1);
    let timeline = engine.normalize(&ma_payload(), "ma");
    let id = engine.start_session(timeline, Arc::new(clock.clone()));

    advance(10).await;
    clock.set_position(0.3);
    advance(40).await;
    clock.set_position(0.6);
    advance(40).await;
    assert_eq!(
        visemes_of(&drain(&mut rx), id),
        vec![Viseme::B, Viseme::A, Viseme::Rest]
    );

    // A seek back into the timeline is picked up on the next tick.
    clock.set_position(0.05);
    advance(40).await;
    assert_eq!(visemes_of(&drain(&mut rx), id), vec![Viseme::B]);
}

#[tokio::test(start_paused = true)]
async fn finished_session_ends_at_rest_with_eyes_open() {
    let (mut engine, mut rx) = engine(true);
    let clock = ManualClock::new();
    clock.play_from(0.3);
    let id = engine.start_session(engine.normalize(&ma_payload(), "ma"), Arc::new(clock));
    advance(50).await;
    drain(&mut rx);

    assert!(engine.playback_finished(id));
    assert_eq!(
        drain(&mut rx),
        vec![
            LipSyncEvent::Viseme {
                session: id,
                viseme: Viseme::Rest
            },
            LipSyncEvent::Eyes {
                session: id,
                open: true
            },
            LipSyncEvent::SessionEnded {
                session: id,
                reason: EndReason::Finished
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn stopped_session_emits_nothing_afterwards() {
    let (mut engine, mut rx) = engine(true);
    let clock = ManualClock::new();
    clock.play_from(0.0);
    let timeline = engine.normalize(&serde_json::json!({}), "a fairly long sentence");
    let id = engine.start_session(timeline, Arc::new(clock.clone()));
    advance(3_000).await;

    assert_eq!(engine.stop(), Some(id));
    let events = drain(&mut rx);
    assert_eq!(
        events.last(),
        Some(&LipSyncEvent::SessionEnded {
            session: id,
            reason: EndReason::Stopped
        })
    );

    // Keep the audio "playing" so a surviving sampler would still emit.
    for step in 0..100u32 {
        clock.set_position(f64::from(step) * 0.1);
        advance(100).await;
    }
    assert!(drain(&mut rx).is_empty());
    assert_eq!(engine.current_session(), None);
}

#[tokio::test(start_paused = true)]
async fn new_session_supersedes_the_old_one() {
    let (mut engine, mut rx) = engine(true);
    let first_clock = ManualClock::new();
    first_clock.play_from(0.1);
    let first = engine.start_session(
        engine.normalize(&ma_payload(), "ma"),
        Arc::new(first_clock.clone()),
    );
    advance(50).await;

    let second_clock = ManualClock::new();
    second_clock.play_from(0.3);
    let second = engine.start_session(
        engine.normalize(&ma_payload(), "ma"),
        Arc::new(second_clock),
    );
    assert_ne!(first, second);

    let events = drain(&mut rx);
    let ended = events
        .iter()
        .position(|e| {
            *e == LipSyncEvent::SessionEnded {
                session: first,
                reason: EndReason::Superseded,
            }
        })
        .expect("first session ended");
    assert!(events[ended + 1..].iter().all(|e| e.session() != first));

    // The old clock keeps moving, but only the new session is heard from.
    for _ in 0..50 {
        first_clock.set_position(0.1);
        advance(100).await;
    }
    let later = drain(&mut rx);
    assert!(later.iter().all(|e| e.session() == second));
    assert_eq!(visemes_of(&later, second).first(), Some(&Viseme::A));

    // Ending the stale session is a no-op.
    assert!(!engine.playback_finished(first));
    assert!(!engine.playback_failed(first, "late error"));
    assert_eq!(engine.current_session(), Some(second));
}

#[tokio::test(start_paused = true)]
async fn failed_playback_tears_down_the_session() {
    let (mut engine, mut rx) = engine(false);
    let clock = ManualClock::new();
    clock.play_from(0.1);
    let id = engine.start_session(engine.normalize(&ma_payload(), "ma"), Arc::new(clock));
    advance(10).await;

    assert!(engine.playback_failed(id, "decoder error"));
    let events = drain(&mut rx);
    assert_eq!(
        events.last(),
        Some(&LipSyncEvent::SessionEnded {
            session: id,
            reason: EndReason::Failed
        })
    );
    assert_eq!(visemes_of(&events, id).last(), Some(&Viseme::Rest));
}

#[tokio::test(start_paused = true)]
async fn blink_toggle_applies_to_live_session() {
    let (mut engine, mut rx) = engine(false);
    let clock = ManualClock::new();
    clock.play_from(0.0);
    let id = engine.start_session(engine.normalize(&ma_payload(), "ma"), Arc::new(clock));
    advance(10_000).await;
    assert!(
        drain(&mut rx)
            .iter()
            .all(|e| !matches!(e, LipSyncEvent::Eyes { .. }))
    );

    engine.set_blink_enabled(true);
    advance(13_000).await;
    let closes = drain(&mut rx)
        .iter()
        .filter(|e| {
            **e == LipSyncEvent::Eyes {
                session: id,
                open: false,
            }
        })
        .count();
    assert!(closes >= 2);
}
