//! Shared test utilities used across multiple test modules.
//!
//! Consolidates event-channel helpers used by `session::tests`,
//! `playback::sampler::tests`, and `engine::tests`.

use crate::runtime::LipSyncEvent;
use crate::viseme::Viseme;
use tokio::sync::mpsc;

/// Take every event currently queued, without waiting.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<LipSyncEvent>) -> Vec<LipSyncEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

/// Queued mouth shapes only, in emission order.
pub fn drain_visemes(rx: &mut mpsc::UnboundedReceiver<LipSyncEvent>) -> Vec<Viseme> {
    drain(rx)
        .into_iter()
        .filter_map(|ev| match ev {
            LipSyncEvent::Viseme { viseme, .. } => Some(viseme),
            _ => None,
        })
        .collect()
}
