//! Configuration types for the lip-sync engine.
//!
//! All values are plain numeric tuning constants. Every struct uses
//! `#[serde(default)]` so a TOML file only needs the keys it changes.

use crate::error::{LipSyncError, Result};
use crate::viseme::MouthAssets;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for the lip-sync engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LipSyncConfig {
    /// Playback sampler settings.
    pub sampler: SamplerConfig,
    /// Blink scheduler settings.
    pub blink: BlinkConfig,
    /// Alignment normalizer settings.
    pub normalizer: NormalizerConfig,
    /// Viseme → asset identifier overrides.
    pub assets: MouthAssets,
}

/// Playback sampler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// How often the audio position is sampled, in ms.
    ///
    /// 16–50 ms keeps the mouth within a frame or two of the audio.
    pub poll_interval_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 33,
        }
    }
}

impl SamplerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Blink scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Whether blinking runs during a session.
    pub enabled: bool,
    /// Shortest wait between blinks, in ms.
    pub min_interval_ms: u64,
    /// Longest wait between blinks, in ms.
    pub max_interval_ms: u64,
    /// Shortest eyes-closed time, in ms.
    pub min_blink_ms: u64,
    /// Longest eyes-closed time, in ms.
    pub max_blink_ms: u64,
    /// Chance that a blink is immediately followed by a second one.
    pub double_blink_probability: f64,
    /// Eyes-open gap between the two blinks of a double blink, in ms.
    pub double_blink_delay_ms: u64,
    /// Fixed RNG seed (None = seeded from OS entropy).
    pub seed: Option<u64>,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_ms: 2_000,
            max_interval_ms: 6_000,
            min_blink_ms: 100,
            max_blink_ms: 180,
            double_blink_probability: 0.2,
            double_blink_delay_ms: 120,
            seed: None,
        }
    }
}

/// How word-level alignment is turned into segments.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordGranularity {
    /// Split each word into equal per-character slices.
    #[default]
    PerCharacter,
    /// One segment per word, shaped by its first vowel.
    ///
    /// Loses intra-word resolution: the mouth holds a single shape for the
    /// whole word.
    WholeWord,
}

/// Alignment normalizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Duration given to a timed unit with no end time, in seconds.
    pub default_unit_duration_secs: f64,
    /// Speaking-rate estimate used when no timing data exists, in seconds per character.
    pub seconds_per_char: f64,
    /// Floor for the estimated utterance duration, in seconds.
    pub min_estimated_duration_secs: f64,
    /// Minimum number of segments in an estimated timeline.
    pub min_estimated_segments: usize,
    /// Representative positions sampled per word in an estimated timeline.
    pub picks_per_word: usize,
    /// Word-level split strategy.
    pub word_granularity: WordGranularity,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            default_unit_duration_secs: 0.08,
            seconds_per_char: 0.06,
            min_estimated_duration_secs: 0.5,
            min_estimated_segments: 5,
            picks_per_word: 3,
            word_granularity: WordGranularity::PerCharacter,
        }
    }
}

fn positive_secs(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LipSyncError::Config(format!(
            "{name} must be a positive number of seconds (got {value})"
        )))
    }
}

fn ordered_bounds(name: &str, min: u64, max: u64) -> Result<()> {
    if min <= max {
        Ok(())
    } else {
        Err(LipSyncError::Config(format!(
            "{name}: min ({min}) exceeds max ({max})"
        )))
    }
}

impl LipSyncConfig {
    /// Check that every bound is usable.
    ///
    /// # Errors
    ///
    /// Returns [`LipSyncError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.sampler.poll_interval_ms == 0 {
            return Err(LipSyncError::Config(
                "sampler.poll_interval_ms must be greater than zero".into(),
            ));
        }

        let blink = &self.blink;
        ordered_bounds("blink interval", blink.min_interval_ms, blink.max_interval_ms)?;
        ordered_bounds("blink duration", blink.min_blink_ms, blink.max_blink_ms)?;
        if blink.min_interval_ms == 0 || blink.min_blink_ms == 0 {
            return Err(LipSyncError::Config(
                "blink intervals and durations must be greater than zero".into(),
            ));
        }
        let p = blink.double_blink_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(LipSyncError::Config(format!(
                "blink.double_blink_probability must be within [0, 1] (got {p})"
            )));
        }

        let norm = &self.normalizer;
        positive_secs(
            "normalizer.default_unit_duration_secs",
            norm.default_unit_duration_secs,
        )?;
        positive_secs("normalizer.seconds_per_char", norm.seconds_per_char)?;
        positive_secs(
            "normalizer.min_estimated_duration_secs",
            norm.min_estimated_duration_secs,
        )?;
        if norm.picks_per_word == 0 {
            return Err(LipSyncError::Config(
                "normalizer.picks_per_word must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| LipSyncError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LipSyncError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/lipsync/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("lipsync").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("lipsync")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/lipsync-config/config.toml")
        }
    }
}
