//! Natural blink animation.
//!
//! Blinking is independent of speech: a randomized state machine decides when
//! the eyes close and for how long, occasionally adding a quick second blink.
//!
//! ```text
//! Idle ──interval──▶ Blinking ──duration──▶ Idle
//!                       │ (p)                 ▲
//!                       ▼                     │
//!              DoubleBlinkPending ──delay──▶ Blinking (second, never chains)
//! ```
//!
//! [`BlinkMachine`] is the pure state machine. [`BlinkScheduler`] drives it
//! with exactly one outstanding timer and stops as soon as its cancellation
//! token fires.

use crate::config::BlinkConfig;
use crate::session::SessionEmitter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Blink state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkState {
    /// Eyes open, waiting for the next blink.
    Idle,
    /// Eyes closed.
    Blinking,
    /// Eyes briefly open between the two halves of a double blink.
    DoubleBlinkPending,
}

/// Result of a transition: the new state, what the eyes show, and how long
/// until the next transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkStep {
    pub state: BlinkState,
    pub eyes_open: bool,
    pub wait: Duration,
}

/// Uniform sample in `[min, max]` milliseconds; swapped bounds are tolerated.
fn sample_ms<R: Rng>(rng: &mut R, min: u64, max: u64) -> Duration {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    Duration::from_millis(rng.gen_range(lo..=hi))
}

/// Pure blink state machine.
#[derive(Debug, Clone)]
pub struct BlinkMachine {
    config: BlinkConfig,
    state: BlinkState,
    /// Whether the current blink is the second half of a double blink.
    second_blink: bool,
}

impl BlinkMachine {
    pub fn new(config: BlinkConfig) -> Self {
        Self {
            config,
            state: BlinkState::Idle,
            second_blink: false,
        }
    }

    pub fn state(&self) -> BlinkState {
        self.state
    }

    fn double_blink_probability(&self) -> f64 {
        let p = self.config.double_blink_probability;
        if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
    }

    fn idle<R: Rng>(&mut self, rng: &mut R) -> BlinkStep {
        self.state = BlinkState::Idle;
        self.second_blink = false;
        BlinkStep {
            state: BlinkState::Idle,
            eyes_open: true,
            wait: sample_ms(rng, self.config.min_interval_ms, self.config.max_interval_ms),
        }
    }

    fn blink<R: Rng>(&mut self, rng: &mut R) -> BlinkStep {
        self.state = BlinkState::Blinking;
        BlinkStep {
            state: BlinkState::Blinking,
            eyes_open: false,
            wait: sample_ms(rng, self.config.min_blink_ms, self.config.max_blink_ms),
        }
    }

    /// Reset to idle and schedule the first blink.
    pub fn start<R: Rng>(&mut self, rng: &mut R) -> BlinkStep {
        self.idle(rng)
    }

    /// Apply the transition for the timer that just fired.
    pub fn advance<R: Rng>(&mut self, rng: &mut R) -> BlinkStep {
        match self.state {
            BlinkState::Idle => self.blink(rng),
            BlinkState::Blinking => {
                if !self.second_blink && rng.gen_bool(self.double_blink_probability()) {
                    self.state = BlinkState::DoubleBlinkPending;
                    self.second_blink = true;
                    BlinkStep {
                        state: BlinkState::DoubleBlinkPending,
                        eyes_open: true,
                        wait: Duration::from_millis(self.config.double_blink_delay_ms),
                    }
                } else {
                    self.idle(rng)
                }
            }
            BlinkState::DoubleBlinkPending => self.blink(rng),
        }
    }
}

/// Timer loop driving a [`BlinkMachine`] for one session.
pub struct BlinkScheduler {
    machine: BlinkMachine,
    rng: StdRng,
    emitter: SessionEmitter,
    cancel: CancellationToken,
}

impl BlinkScheduler {
    /// Create a scheduler. The RNG is seeded from `config.seed` when set.
    pub fn new(config: BlinkConfig, emitter: SessionEmitter, cancel: CancellationToken) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            machine: BlinkMachine::new(config),
            rng,
            emitter,
            cancel,
        }
    }

    /// Run until the cancellation token fires or the session goes stale.
    ///
    /// Emits eyes-open immediately, then one event per transition.
    pub async fn run(mut self) {
        let session = self.emitter.session();
        let mut step = self.machine.start(&mut self.rng);
        if !self.emitter.emit_eyes(true) {
            return;
        }
        debug!(%session, "blink scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(%session, "blink scheduler cancelled");
                    break;
                }
                _ = tokio::time::sleep(step.wait) => {
                    step = self.machine.advance(&mut self.rng);
                    trace!(%session, state = ?step.state, wait_ms = step.wait.as_millis() as u64, "blink transition");
                    if !self.emitter.emit_eyes(step.eyes_open) {
                        break;
                    }
                }
            }
        }
    }
}
