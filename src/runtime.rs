//! Events emitted by the engine for the rendering layer.
//!
//! Intentionally lightweight (no heavy payloads) so timer loops can emit
//! without blocking. Consumers keep only the latest value of each stream.

use crate::session::SessionId;
use crate::viseme::Viseme;
use serde::Serialize;

/// Why a session stopped producing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Audio played to the end.
    Finished,
    /// Host stopped playback.
    Stopped,
    /// Audio collaborator reported a fatal playback error.
    Failed,
    /// A newer session replaced this one.
    Superseded,
}

/// Events that describe what the avatar should show "right now".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LipSyncEvent {
    /// Mouth shape changed (coalesced: never repeats the previous value).
    Viseme { session: SessionId, viseme: Viseme },
    /// Eyes opened or closed.
    Eyes { session: SessionId, open: bool },
    /// The session was torn down; no further events carry its id.
    SessionEnded { session: SessionId, reason: EndReason },
}

impl LipSyncEvent {
    /// Session this event belongs to.
    pub fn session(&self) -> SessionId {
        match self {
            LipSyncEvent::Viseme { session, .. }
            | LipSyncEvent::Eyes { session, .. }
            | LipSyncEvent::SessionEnded { session, .. } => *session,
        }
    }
}
