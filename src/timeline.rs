//! Canonical viseme timeline and the "which mouth shape is correct now" query.
//!
//! A [`VisemeTimeline`] is the provider-agnostic output of normalization:
//! segments sorted by start time. [`VisemeTimeline::resolve`] is a pure
//! lookup, safe to call from any tick with any timestamp (including after
//! seeks), and holds no state between calls.

use crate::error::Result;
use crate::viseme::Viseme;
use serde::{Deserialize, Serialize};

/// One timed mouth shape, in seconds from the start of the audio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisemeSegment {
    pub viseme: Viseme,
    pub start_time: f64,
    pub end_time: f64,
}

impl VisemeSegment {
    /// Build a segment, clamping `end_time` so it is never before `start_time`.
    pub fn new(viseme: Viseme, start_time: f64, end_time: f64) -> Self {
        Self {
            viseme,
            start_time,
            end_time: end_time.max(start_time),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Half-open containment: `start <= t < end`.
    pub fn contains(&self, t: f64) -> bool {
        self.start_time <= t && t < self.end_time
    }
}

/// Ordered sequence of viseme segments. Empty means "no animation data".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisemeTimeline {
    segments: Vec<VisemeSegment>,
    /// `reach[i]` is the latest end time among `segments[..=i]`.
    #[serde(skip)]
    reach: Vec<f64>,
}

impl VisemeTimeline {
    /// Build a timeline from segments in any order.
    ///
    /// Segments with non-finite times are dropped, negative start times are
    /// clamped to zero and end times are clamped to their start. Sorting is
    /// stable, so equal start times keep source order.
    pub fn new(segments: impl IntoIterator<Item = VisemeSegment>) -> Self {
        let mut segments: Vec<VisemeSegment> = segments
            .into_iter()
            .filter(|s| s.start_time.is_finite() && s.end_time.is_finite())
            .map(|s| {
                let start = s.start_time.max(0.0);
                VisemeSegment::new(s.viseme, start, s.end_time)
            })
            .collect();
        segments.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        let mut reach = Vec::with_capacity(segments.len());
        let mut furthest = f64::NEG_INFINITY;
        for seg in &segments {
            furthest = furthest.max(seg.end_time);
            reach.push(furthest);
        }

        Self { segments, reach }
    }

    /// The empty timeline.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[VisemeSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Latest end time across all segments (0 for an empty timeline).
    pub fn duration(&self) -> f64 {
        self.reach.last().copied().unwrap_or(0.0)
    }

    /// Viseme active at `t` seconds.
    ///
    /// Returns [`Viseme::Rest`] before the first segment, inside gaps, at or
    /// after the end of the last segment, and for non-finite `t`. When
    /// segments overlap, the earliest-starting one wins.
    pub fn resolve(&self, t: f64) -> Viseme {
        if !t.is_finite() {
            return Viseme::Rest;
        }
        // First index whose running max end passes `t`. That segment is the
        // only candidate: everything before it ends at or before `t`, and
        // everything after it starts no earlier.
        let idx = self.reach.partition_point(|&end| end <= t);
        match self.segments.get(idx) {
            Some(seg) if seg.contains(t) => seg.viseme,
            _ => Viseme::Rest,
        }
    }

    /// Coalesce consecutive segments with the same viseme whose edges touch.
    pub fn merge_adjacent(self) -> Self {
        let mut merged: Vec<VisemeSegment> = Vec::with_capacity(self.segments.len());
        for seg in self.segments {
            if let Some(last) = merged.last_mut()
                && last.viseme == seg.viseme
                && (seg.start_time - last.end_time).abs() < 1e-9
            {
                last.end_time = last.end_time.max(seg.end_time);
                continue;
            }
            merged.push(seg);
        }
        Self::new(merged)
    }

    /// Pretty-printed JSON array of the segments.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LipSyncError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.segments)?)
    }
}

/// Free-function form of [`VisemeTimeline::resolve`].
pub fn resolve(timeline: &VisemeTimeline, t: f64) -> Viseme {
    timeline.resolve(t)
}
