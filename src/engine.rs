//! Engine facade: normalizes alignment payloads and runs play sessions.
//!
//! # Usage
//!
//! ```rust,ignore
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let mut engine = LipSyncEngine::new(LipSyncConfig::default(), tx)?;
//! let timeline = engine.normalize(&payload, &text);
//! let session = engine.start_session(timeline, Arc::new(clock));
//! // ... audio layer reports the end of playback:
//! engine.playback_finished(session);
//! ```
//!
//! All methods are synchronous and must be called from inside a tokio
//! runtime (session timers are spawned as tasks).

use crate::alignment::Normalizer;
use crate::blink::BlinkScheduler;
use crate::config::{BlinkConfig, LipSyncConfig};
use crate::error::Result;
use crate::playback::{PlaybackClock, PlaybackSampler};
use crate::runtime::{EndReason, LipSyncEvent};
use crate::session::{SessionEmitter, SessionHandle, SessionId, SessionManager};
use crate::timeline::VisemeTimeline;
use crate::viseme::Viseme;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Lip-sync engine owning the live play session.
#[derive(Debug)]
pub struct LipSyncEngine {
    config: LipSyncConfig,
    normalizer: Normalizer,
    sessions: SessionManager,
    blink_enabled: bool,
}

impl LipSyncEngine {
    /// Create an engine that publishes events on `tx`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LipSyncError::Config`] if the config fails validation.
    pub fn new(config: LipSyncConfig, tx: mpsc::UnboundedSender<LipSyncEvent>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            normalizer: Normalizer::new(config.normalizer.clone()),
            blink_enabled: config.blink.enabled,
            sessions: SessionManager::new(tx),
            config,
        })
    }

    pub fn config(&self) -> &LipSyncConfig {
        &self.config
    }

    /// Normalize a provider alignment payload (see [`Normalizer::normalize`]).
    pub fn normalize(&self, payload: &Value, text: &str) -> VisemeTimeline {
        self.normalizer.normalize(payload, text)
    }

    /// Asset identifier for `viseme` under the configured mapping.
    pub fn asset_for(&self, viseme: Viseme) -> &str {
        self.config.assets.asset_for(viseme)
    }

    /// Start a play session for audio that has begun playing.
    ///
    /// Any previous session is torn down first (its consumer sees
    /// `SessionEnded { reason: Superseded }`), then the sampler and, if
    /// enabled, the blink loop are armed for the new one.
    pub fn start_session(
        &mut self,
        timeline: VisemeTimeline,
        clock: Arc<dyn PlaybackClock>,
    ) -> SessionId {
        let poll_interval = self.config.sampler.poll_interval();
        let blink_config = self.config.blink.clone();
        let blink_enabled = self.blink_enabled;

        let sink = self.sessions.sink().clone();
        let handle = self.sessions.start_session();
        let id = handle.id();
        let segments = timeline.len();

        let sampler = PlaybackSampler::new(
            Arc::new(timeline),
            clock,
            sink.for_session(id),
            handle.token(),
            poll_interval,
        );
        handle.spawn(sampler.run());

        if blink_enabled {
            spawn_blink(handle, blink_config, sink.for_session(id));
        }

        info!(session = %id, segments, blink = blink_enabled, "lip-sync session armed");
        id
    }

    /// Id of the live session, if any.
    pub fn current_session(&self) -> Option<SessionId> {
        self.sessions.current_id()
    }

    /// Stop whatever session is live (host stopped playback or unmounted).
    pub fn stop(&mut self) -> Option<SessionId> {
        self.sessions.end_current(EndReason::Stopped)
    }

    /// Audio for `session` played to the end.
    ///
    /// Returns `false` if `session` is no longer the live one.
    pub fn playback_finished(&mut self, session: SessionId) -> bool {
        self.sessions.end_session(session, EndReason::Finished)
    }

    /// Audio for `session` failed.
    pub fn playback_failed(&mut self, session: SessionId, reason: &str) -> bool {
        warn!(%session, reason, "playback failed");
        self.sessions.end_session(session, EndReason::Failed)
    }

    pub fn blink_enabled(&self) -> bool {
        self.blink_enabled
    }

    /// Enable or disable blinking.
    ///
    /// Disabling cancels the blink timer immediately and reopens the eyes.
    /// Enabling takes effect on the live session right away.
    pub fn set_blink_enabled(&mut self, enabled: bool) {
        if self.blink_enabled == enabled {
            return;
        }
        self.blink_enabled = enabled;

        let blink_config = self.config.blink.clone();
        let sink = self.sessions.sink().clone();
        let Some(handle) = self.sessions.current_mut() else {
            return;
        };
        let emitter = sink.for_session(handle.id());
        if enabled {
            spawn_blink(handle, blink_config, emitter);
        } else if handle.stop_blink() {
            emitter.emit_eyes(true);
        }
    }
}

fn spawn_blink(handle: &mut SessionHandle, config: BlinkConfig, emitter: SessionEmitter) {
    handle.spawn_blink(move |cancel| BlinkScheduler::new(config, emitter, cancel).run());
}
