//! Shared helpers for integration tests.

use lipsync::{LipSyncConfig, LipSyncEngine, LipSyncEvent, SessionId, Viseme};
use serde_json::{Value, json};
use tokio::sync::mpsc;

/// Engine with a fixed blink seed. Returns `(engine, event_rx)`.
pub(crate) fn engine(blink: bool) -> (LipSyncEngine, mpsc::UnboundedReceiver<LipSyncEvent>) {
    let mut config = LipSyncConfig::default();
    config.blink.enabled = blink;
    config.blink.seed = Some(42);
    let (tx, rx) = mpsc::unbounded_channel();
    let engine = LipSyncEngine::new(config, tx).expect("default config is valid");
    (engine, rx)
}

/// Two-phoneme "ma" payload: `m` over [0, 0.2), `a` over [0.2, 0.5).
pub(crate) fn ma_payload() -> Value {
    json!({
        "phonemes": [
            {"phoneme": "m", "start_time": 0.0, "end_time": 0.2},
            {"phoneme": "a", "start_time": 0.2, "end_time": 0.5}
        ]
    })
}

/// Every event currently queued, without waiting.
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<LipSyncEvent>) -> Vec<LipSyncEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

/// Mouth shapes emitted for `session`, in order.
pub(crate) fn visemes_of(events: &[LipSyncEvent], session: SessionId) -> Vec<Viseme> {
    events
        .iter()
        .filter_map(|ev| match ev {
            LipSyncEvent::Viseme { session: s, viseme } if *s == session => Some(*viseme),
            _ => None,
        })
        .collect()
}
