//! Alignment payloads from the TTS provider.
//!
//! Providers return timing metadata alongside synthesized audio, in one of a
//! few shapes and without a type tag. [`AlignmentSource::parse`] is the single
//! boundary where that untyped JSON becomes a typed value: each known shape is
//! tried in a fixed priority order and the first that yields usable units
//! wins. Anything else is [`AlignmentSource::Unrecognized`], never an error.
//!
//! | Priority | Shape |
//! |----------|-------|
//! | 1 | `{ phonemes: [{phoneme, start_time, end_time}] }` |
//! | 2 | `{ characters: [..], character_start_times_seconds: [..], character_end_times_seconds?: [..] }` |
//! | 3 | `{ words: [{word, start, duration}] }` |
//!
//! Character timing may also arrive nested under `alignment` or
//! `normalized_alignment`.

pub mod estimate;
pub mod normalize;

pub use normalize::Normalizer;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// One phoneme with its time range, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct PhonemeUnit {
    pub symbol: String,
    pub start_time: f64,
    /// `None` when the provider omitted it.
    pub end_time: Option<f64>,
}

/// One character with its start time and optional end time, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterUnit {
    pub character: String,
    pub start_time: f64,
    pub end_time: Option<f64>,
}

/// One word with its start time and duration, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct WordUnit {
    pub text: String,
    pub start_time: f64,
    pub duration: f64,
}

/// Structurally detected alignment payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AlignmentSource {
    PhonemeLevel(Vec<PhonemeUnit>),
    CharacterLevel(Vec<CharacterUnit>),
    WordLevel(Vec<WordUnit>),
    Unrecognized,
}

#[derive(Debug, Deserialize)]
struct RawPhoneme {
    #[serde(alias = "symbol")]
    phoneme: String,
    start_time: f64,
    #[serde(default)]
    end_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawWord {
    #[serde(alias = "text")]
    word: String,
    #[serde(alias = "start_time")]
    start: f64,
    duration: f64,
}

fn usable_time(t: f64) -> bool {
    t.is_finite() && t >= 0.0
}

/// Deserialize each element on its own, skipping the ones that don't fit.
fn parse_entries<T: serde::de::DeserializeOwned>(list: &[Value]) -> Vec<T> {
    let mut out = Vec::with_capacity(list.len());
    let mut skipped = 0usize;
    for entry in list {
        match T::deserialize(entry) {
            Ok(parsed) => out.push(parsed),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(skipped, kept = out.len(), "skipped malformed alignment entries");
    }
    out
}

fn number_list(value: Option<&Value>) -> Option<Vec<Option<f64>>> {
    let list = value?.as_array()?;
    Some(
        list.iter()
            .map(|v| v.as_f64().filter(|t| usable_time(*t)))
            .collect(),
    )
}

impl AlignmentSource {
    /// Detect the payload shape. Never fails.
    pub fn parse(payload: &Value) -> Self {
        if let Some(units) = Self::phoneme_units(payload) {
            return AlignmentSource::PhonemeLevel(units);
        }
        let char_payload = ["alignment", "normalized_alignment"]
            .iter()
            .filter_map(|key| payload.get(key))
            .chain(std::iter::once(payload))
            .find_map(Self::character_units);
        if let Some(units) = char_payload {
            return AlignmentSource::CharacterLevel(units);
        }
        if let Some(units) = Self::word_units(payload) {
            return AlignmentSource::WordLevel(units);
        }
        AlignmentSource::Unrecognized
    }

    /// Parse raw JSON text; unparseable text is [`AlignmentSource::Unrecognized`].
    pub fn parse_str(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::parse(&value),
            Err(e) => {
                debug!(error = %e, "alignment payload is not JSON");
                AlignmentSource::Unrecognized
            }
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AlignmentSource::PhonemeLevel(_) => "phoneme",
            AlignmentSource::CharacterLevel(_) => "character",
            AlignmentSource::WordLevel(_) => "word",
            AlignmentSource::Unrecognized => "unrecognized",
        }
    }

    fn phoneme_units(payload: &Value) -> Option<Vec<PhonemeUnit>> {
        let list = payload.get("phonemes")?.as_array()?;
        let units: Vec<PhonemeUnit> = parse_entries::<RawPhoneme>(list)
            .into_iter()
            .filter(|p| usable_time(p.start_time))
            .map(|p| PhonemeUnit {
                symbol: p.phoneme,
                start_time: p.start_time,
                end_time: p.end_time.filter(|t| t.is_finite()),
            })
            .collect();
        (!units.is_empty()).then_some(units)
    }

    /// Zip characters with their timestamps, truncating to the shortest array.
    fn character_units(payload: &Value) -> Option<Vec<CharacterUnit>> {
        let chars = payload.get("characters")?.as_array()?;
        let starts = number_list(payload.get("character_start_times_seconds"))?;
        let ends = number_list(payload.get("character_end_times_seconds")).unwrap_or_default();

        if chars.len() != starts.len() {
            debug!(
                characters = chars.len(),
                timestamps = starts.len(),
                "character/timestamp length mismatch, truncating"
            );
        }

        let units: Vec<CharacterUnit> = chars
            .iter()
            .zip(starts)
            .enumerate()
            .filter_map(|(i, (ch, start))| {
                let start = start?;
                let character = match ch {
                    Value::String(s) => s.clone(),
                    _ => String::new(),
                };
                Some(CharacterUnit {
                    character,
                    start_time: start,
                    end_time: ends.get(i).copied().flatten(),
                })
            })
            .collect();
        (!units.is_empty()).then_some(units)
    }

    fn word_units(payload: &Value) -> Option<Vec<WordUnit>> {
        let list = payload.get("words")?.as_array()?;
        let units: Vec<WordUnit> = parse_entries::<RawWord>(list)
            .into_iter()
            .filter(|w| usable_time(w.start) && usable_time(w.duration))
            .map(|w| WordUnit {
                text: w.word,
                start_time: w.start,
                duration: w.duration,
            })
            .collect();
        (!units.is_empty()).then_some(units)
    }
}
