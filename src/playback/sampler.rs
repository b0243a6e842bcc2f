//! Playback sampler: polls the playhead and emits mouth-shape changes.
//!
//! Every tick reads the audio position and resolves it against the session's
//! timeline. Only changes are emitted. The sampler does not care why the
//! position moved (playback, seek, resume), so seeks need no special casing.
//!
//! The loop ends, after emitting [`Viseme::Rest`], when there is no timeline
//! or the audio is no longer playing. A failed clock query skips that tick
//! and keeps the previous shape.

use super::PlaybackClock;
use crate::session::SessionEmitter;
use crate::timeline::VisemeTimeline;
use crate::viseme::Viseme;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What the loop should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

/// Periodic playhead poller for one session.
pub struct PlaybackSampler {
    timeline: Arc<VisemeTimeline>,
    clock: Arc<dyn PlaybackClock>,
    emitter: SessionEmitter,
    cancel: CancellationToken,
    poll_interval: Duration,
    last: Option<Viseme>,
}

/// Shortest accepted poll period; `tokio::time::interval` rejects zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

impl PlaybackSampler {
    /// `poll_interval` is clamped to at least 1 ms.
    pub fn new(
        timeline: Arc<VisemeTimeline>,
        clock: Arc<dyn PlaybackClock>,
        emitter: SessionEmitter,
        cancel: CancellationToken,
        poll_interval: Duration,
    ) -> Self {
        Self {
            timeline,
            clock,
            emitter,
            cancel,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            last: None,
        }
    }

    /// Last viseme this sampler emitted.
    pub fn last_emitted(&self) -> Option<Viseme> {
        self.last
    }

    /// Emit `viseme` unless it repeats the previous emission.
    ///
    /// Returns `false` once the session is no longer live.
    fn emit_changed(&mut self, viseme: Viseme) -> bool {
        if self.last == Some(viseme) {
            return true;
        }
        if !self.emitter.emit_viseme(viseme) {
            return false;
        }
        self.last = Some(viseme);
        true
    }

    /// Sample the clock once.
    pub async fn tick(&mut self) -> TickOutcome {
        let session = self.emitter.session();
        if self.timeline.is_empty() {
            self.emit_changed(Viseme::Rest);
            return TickOutcome::Stop;
        }

        match self.clock.is_playing().await {
            Ok(true) => {}
            Ok(false) => {
                debug!(%session, "audio not playing, sampler stopping");
                self.emit_changed(Viseme::Rest);
                return TickOutcome::Stop;
            }
            Err(e) => {
                warn!(%session, error = %e, "playback state query failed, skipping tick");
                return TickOutcome::Continue;
            }
        }

        let position = match self.clock.position_secs().await {
            Ok(p) => p,
            Err(e) => {
                warn!(%session, error = %e, "position query failed, skipping tick");
                return TickOutcome::Continue;
            }
        };

        if self.emit_changed(self.timeline.resolve(position)) {
            TickOutcome::Continue
        } else {
            TickOutcome::Stop
        }
    }

    /// Poll until cancelled or the audio stops.
    ///
    /// Ticks are serialized: the next one does not start until the previous
    /// clock query has returned. A query still in flight when the session is
    /// cancelled is dropped.
    pub async fn run(mut self) {
        let session = self.emitter.session();
        let cancel = self.cancel.clone();
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(
            %session,
            segments = self.timeline.len(),
            poll_ms = self.poll_interval.as_millis() as u64,
            "playback sampler started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                outcome = self.tick() => outcome,
            };
            if outcome == TickOutcome::Stop {
                break;
            }
        }
        debug!(%session, last = ?self.last, "playback sampler stopped");
    }
}
