//! Alignment payload → canonical [`VisemeTimeline`].
//!
//! Normalization never fails. Malformed entries are skipped, mismatched
//! arrays are truncated, missing end times are synthesized, and a payload
//! with no usable timing at all falls back to an estimate built from the
//! spoken text (see [`super::estimate`]).

use super::estimate::estimate_timeline;
use super::{AlignmentSource, CharacterUnit, PhonemeUnit, WordUnit};
use crate::config::{NormalizerConfig, WordGranularity};
use crate::timeline::{VisemeSegment, VisemeTimeline};
use crate::viseme::{self, Viseme};
use serde_json::Value;
use tracing::debug;

/// Converts provider alignment payloads into viseme timelines.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a decoded JSON payload. `text` is only used when the payload
    /// carries no usable timing data.
    pub fn normalize(&self, payload: &Value, text: &str) -> VisemeTimeline {
        self.normalize_source(AlignmentSource::parse(payload), text)
    }

    /// Normalize raw JSON text. Unparseable text is treated as a payload with
    /// no timing data.
    pub fn normalize_str(&self, raw: &str, text: &str) -> VisemeTimeline {
        self.normalize_source(AlignmentSource::parse_str(raw), text)
    }

    /// Normalize an already-detected alignment source.
    pub fn normalize_source(&self, source: AlignmentSource, text: &str) -> VisemeTimeline {
        let kind = source.kind();
        let timeline = match source {
            AlignmentSource::PhonemeLevel(units) => self.from_phonemes(&units),
            AlignmentSource::CharacterLevel(units) => self.from_characters(&units),
            AlignmentSource::WordLevel(units) => self.from_words(&units),
            AlignmentSource::Unrecognized => {
                debug!(chars = text.len(), "no timing data, estimating timeline from text");
                estimate_timeline(text, &self.config)
            }
        };
        debug!(source = kind, segments = timeline.len(), "normalized alignment");
        timeline
    }

    /// One segment per phoneme. A missing end time, or one before the start,
    /// becomes `start + default unit duration`.
    fn from_phonemes(&self, units: &[PhonemeUnit]) -> VisemeTimeline {
        let fallback = self.config.default_unit_duration_secs;
        VisemeTimeline::new(units.iter().map(|u| {
            let end = match u.end_time {
                Some(end) if end >= u.start_time => end,
                _ => u.start_time + fallback,
            };
            VisemeSegment::new(viseme::classify(&u.symbol), u.start_time, end)
        }))
    }

    /// One segment per character. Missing end times become
    /// `min(next start, start + default unit duration)`.
    fn from_characters(&self, units: &[CharacterUnit]) -> VisemeTimeline {
        // Classify in text order so clusters see their real neighbours.
        let chars: Vec<char> = units
            .iter()
            .map(|u| u.character.chars().next().unwrap_or(' '))
            .collect();
        let mut classified: Vec<(Viseme, &CharacterUnit)> = viseme::classify_chars(&chars)
            .into_iter()
            .zip(units)
            .collect();
        classified.sort_by(|a, b| a.1.start_time.total_cmp(&b.1.start_time));

        let fallback = self.config.default_unit_duration_secs;
        let segments = classified.iter().enumerate().map(|(i, (viseme, unit))| {
            let start = unit.start_time;
            let end = match unit.end_time {
                Some(end) if end >= start => end,
                _ => {
                    let capped = start + fallback;
                    classified
                        .get(i + 1)
                        .map(|(_, next)| next.start_time.min(capped))
                        .unwrap_or(capped)
                }
            };
            VisemeSegment::new(*viseme, start, end)
        });
        VisemeTimeline::new(segments)
    }

    fn from_words(&self, units: &[WordUnit]) -> VisemeTimeline {
        match self.config.word_granularity {
            WordGranularity::PerCharacter => {
                VisemeTimeline::new(units.iter().flat_map(split_word))
            }
            WordGranularity::WholeWord => VisemeTimeline::new(units.iter().filter_map(|w| {
                let shape = representative_viseme(&w.text)?;
                Some(VisemeSegment::new(shape, w.start_time, w.start_time + w.duration))
            }))
            .merge_adjacent(),
        }
    }
}

/// Equal time slices per character of the word.
fn split_word(word: &WordUnit) -> Vec<VisemeSegment> {
    let chars: Vec<char> = word.text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    let slice = word.duration / chars.len() as f64;
    viseme::classify_chars(&chars)
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            let start = word.start_time + slice * i as f64;
            VisemeSegment::new(v, start, start + slice)
        })
        .collect()
}

/// First vowel shape of a word, else its first non-rest shape.
fn representative_viseme(text: &str) -> Option<Viseme> {
    let shapes = viseme::classify_text(text);
    shapes
        .iter()
        .copied()
        .find(|v| v.is_vowel())
        .or_else(|| shapes.iter().copied().find(|v| *v != Viseme::Rest))
}
