//! Audio playback collaborator seam.
//!
//! The engine does not play audio. It only asks the host's audio layer two
//! questions on every sampler tick: is this session's sound playing, and
//! where is the playhead. [`PlaybackClock`] is that contract.

pub mod sampler;

pub use sampler::PlaybackSampler;

use crate::error::{LipSyncError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Read-only view of the host's audio playback.
///
/// Implementations may be asynchronous (e.g. a status query across an FFI
/// or IPC boundary). The sampler awaits each call before starting the next
/// tick, so calls are never concurrent for one session.
#[async_trait]
pub trait PlaybackClock: Send + Sync {
    /// Whether the session's audio is currently playing.
    async fn is_playing(&self) -> Result<bool>;

    /// Current playhead position in seconds.
    async fn position_secs(&self) -> Result<f64>;
}

#[derive(Debug, Default)]
struct ManualState {
    playing: bool,
    position_secs: f64,
    /// Number of upcoming position queries that should fail.
    failures: u32,
}

/// A [`PlaybackClock`] the host pushes updates into.
///
/// For audio layers that report position through callbacks rather than a
/// query API. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ManualState) -> T) -> Result<T> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| LipSyncError::Audio(format!("clock state lock poisoned: {e}")))?;
        Ok(f(&mut guard))
    }

    /// Apply a host-side update. Returns `false` if it could not be applied.
    fn update(&self, what: &'static str, f: impl FnOnce(&mut ManualState)) -> bool {
        match self.with_state(f) {
            Ok(()) => true,
            Err(e) => {
                warn!(update = what, error = %e, "manual clock update dropped");
                false
            }
        }
    }

    /// Mark playback as started at `position_secs`.
    ///
    /// Each setter returns `false` (and logs a warning) if the shared state
    /// is poisoned and the update was lost.
    pub fn play_from(&self, position_secs: f64) -> bool {
        self.update("play_from", |s| {
            s.playing = true;
            s.position_secs = position_secs;
        })
    }

    pub fn set_playing(&self, playing: bool) -> bool {
        self.update("set_playing", |s| s.playing = playing)
    }

    /// Move the playhead (natural progress or a seek).
    pub fn set_position(&self, position_secs: f64) -> bool {
        self.update("set_position", |s| s.position_secs = position_secs)
    }

    /// Make the next `count` position queries fail.
    pub fn fail_next(&self, count: u32) -> bool {
        self.update("fail_next", |s| s.failures = count)
    }
}

#[async_trait]
impl PlaybackClock for ManualClock {
    async fn is_playing(&self) -> Result<bool> {
        self.with_state(|s| s.playing)
    }

    async fn position_secs(&self) -> Result<f64> {
        self.with_state(|s| {
            if s.failures > 0 {
                s.failures -= 1;
                Err(LipSyncError::Audio("position unavailable".into()))
            } else {
                Ok(s.position_secs)
            }
        })?
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[tokio::test]
    async fn manual_clock_reports_pushed_state() {
        let clock = ManualClock::new();
        assert!(!clock.is_playing().await.unwrap());

        clock.play_from(1.5);
        assert!(clock.is_playing().await.unwrap());
        assert!((clock.position_secs().await.unwrap() - 1.5).abs() < f64::EPSILON);

        clock.set_position(0.25);
        assert!((clock.position_secs().await.unwrap() - 0.25).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn manual_clock_injected_failures_are_consumed() {
        let clock = ManualClock::new();
        clock.play_from(0.0);
        clock.fail_next(2);
        assert!(clock.position_secs().await.is_err());
        assert!(clock.position_secs().await.is_err());
        assert!(clock.position_secs().await.is_ok());
    }

    #[tokio::test]
    async fn poisoned_state_is_reported_not_swallowed() {
        let clock = ManualClock::new();
        let shared = Arc::clone(&clock.state);
        let _ = std::thread::spawn(move || {
            let _guard = shared.lock().unwrap();
            panic!("poison the clock state");
        })
        .join();

        assert!(!clock.play_from(1.0));
        assert!(!clock.set_position(2.0));
        assert!(clock.is_playing().await.is_err());
        assert!(matches!(
            clock.position_secs().await,
            Err(LipSyncError::Audio(_))
        ));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let clock = ManualClock::new();
        let host_side = clock.clone();
        host_side.play_from(3.0);
        assert!(clock.is_playing().await.unwrap());
    }
}
