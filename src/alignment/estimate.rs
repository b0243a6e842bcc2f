//! Estimated timeline for speech with no timing data.
//!
//! The utterance length is guessed from the character count, split across
//! words by length, and each word contributes a few representative mouth
//! shapes. Short utterances are padded with a vowel cycle so the mouth always
//! has some movement to show.

use crate::config::NormalizerConfig;
use crate::timeline::{VisemeSegment, VisemeTimeline};
use crate::viseme::{self, Viseme};

/// Vowel shapes cycled to pad short estimates.
const VOWEL_CYCLE: [Viseme; 5] = [Viseme::A, Viseme::E, Viseme::I, Viseme::O, Viseme::U];

/// Estimated spoken duration of `text`, in seconds.
pub fn estimated_duration(text: &str, config: &NormalizerConfig) -> f64 {
    let chars = text.chars().filter(|c| !c.is_whitespace()).count();
    (chars as f64 * config.seconds_per_char).max(config.min_estimated_duration_secs)
}

/// Build an approximate timeline spanning `[0, estimated_duration(text)]`.
///
/// Empty or whitespace-only text yields the empty timeline.
pub fn estimate_timeline(text: &str, config: &NormalizerConfig) -> VisemeTimeline {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return VisemeTimeline::empty();
    }

    let total = estimated_duration(text, config);
    let weight: usize = words.iter().map(|w| w.chars().count()).sum();

    let mut segments = Vec::new();
    let mut cursor = 0.0;
    for word in &words {
        let slice = total * word.chars().count() as f64 / weight as f64;
        let picks = representative_picks(word, config.picks_per_word);
        let step = slice / picks.len() as f64;
        for (i, v) in picks.into_iter().enumerate() {
            let start = cursor + step * i as f64;
            segments.push(VisemeSegment::new(v, start, (start + step).min(total)));
        }
        cursor += slice;
    }

    if segments.len() < config.min_estimated_segments {
        segments = pad_with_vowels(&segments, config.min_estimated_segments, total);
    }

    VisemeTimeline::new(segments)
}

/// Evenly spaced shapes from the word, making sure a vowel is among them if
/// the word has one. Punctuation is dropped; a word with no shapes at all
/// contributes a single rest.
fn representative_picks(word: &str, max_picks: usize) -> Vec<Viseme> {
    let shapes: Vec<Viseme> = viseme::classify_text(word)
        .into_iter()
        .filter(|v| *v != Viseme::Rest)
        .collect();
    if shapes.is_empty() {
        return vec![Viseme::Rest];
    }
    if shapes.len() <= max_picks {
        return shapes;
    }

    let mut picks: Vec<Viseme> = (0..max_picks)
        .map(|i| shapes[i * shapes.len() / max_picks])
        .collect();
    if !picks.iter().any(|v| v.is_vowel())
        && let Some(vowel) = shapes.iter().copied().find(|v| v.is_vowel())
    {
        let mid = picks.len() / 2;
        picks[mid] = vowel;
    }
    picks
}

/// Redistribute `min_count` equal segments over `[0, total]`: the existing
/// shapes first, then the vowel cycle.
fn pad_with_vowels(segments: &[VisemeSegment], min_count: usize, total: f64) -> Vec<VisemeSegment> {
    let shapes = segments
        .iter()
        .map(|s| s.viseme)
        .chain(VOWEL_CYCLE.iter().copied().cycle())
        .take(min_count.max(segments.len()));
    let shapes: Vec<Viseme> = shapes.collect();
    let step = total / shapes.len() as f64;
    shapes
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            let start = step * i as f64;
            VisemeSegment::new(v, start, (start + step).min(total))
        })
        .collect()
}
