//! lipsync: lip-sync synchronization engine for a talking avatar.
//!
//! Converts text-to-speech timing payloads into a canonical viseme timeline,
//! resolves the correct mouth shape as audio plays, and runs an independent
//! blink animation:
//!
//! Alignment payload → Normalizer → Timeline → Sampler (per tick) → events
//!
//! # Architecture
//!
//! - **Viseme catalog**: mouth shapes and phoneme/character classification
//! - **Alignment**: typed parse of untyped provider payloads, normalization,
//!   and estimated timelines when no timing exists
//! - **Timeline**: sorted segments and the pure `resolve(t)` query
//! - **Playback sampler**: polls the host's audio clock, emits changes
//! - **Blink scheduler**: randomized eye animation, independent of speech
//! - **Sessions**: one live playback attempt owning all timers

pub mod alignment;
pub mod blink;
pub mod config;
pub mod engine;
pub mod error;
pub mod playback;
pub mod runtime;
pub mod session;
pub mod timeline;
pub mod viseme;

#[cfg(test)]
pub(crate) mod test_utils;

pub use alignment::{AlignmentSource, Normalizer};
pub use config::LipSyncConfig;
pub use engine::LipSyncEngine;
pub use error::{LipSyncError, Result};
pub use playback::{ManualClock, PlaybackClock};
pub use runtime::{EndReason, LipSyncEvent};
pub use session::SessionId;
pub use timeline::{VisemeSegment, VisemeTimeline, resolve};
pub use viseme::{Viseme, classify};
