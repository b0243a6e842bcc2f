//! Viseme → asset identifier mapping for the rendering layer.

use super::Viseme;
use serde::{Deserialize, Serialize};

/// Host-provided asset identifiers for each mouth shape.
///
/// `rest` is mandatory. Every other entry is optional and falls back to
/// [`Viseme::default_asset`], so a lookup can never miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MouthAssets {
    pub rest: String,
    pub a: Option<String>,
    pub b: Option<String>,
    pub c: Option<String>,
    pub d: Option<String>,
    pub e: Option<String>,
    pub f: Option<String>,
    pub g: Option<String>,
    pub i: Option<String>,
    pub o: Option<String>,
    pub u: Option<String>,
    pub th: Option<String>,
    pub wq: Option<String>,
}

impl Default for MouthAssets {
    fn default() -> Self {
        Self::with_rest(Viseme::Rest.default_asset())
    }
}

impl MouthAssets {
    /// Mapping with only the rest asset set; everything else uses defaults.
    pub fn with_rest(rest: impl Into<String>) -> Self {
        Self {
            rest: rest.into(),
            a: None,
            b: None,
            c: None,
            d: None,
            e: None,
            f: None,
            g: None,
            i: None,
            o: None,
            u: None,
            th: None,
            wq: None,
        }
    }

    /// Asset identifier for `viseme`.
    pub fn asset_for(&self, viseme: Viseme) -> &str {
        let entry = match viseme {
            Viseme::Rest => return &self.rest,
            Viseme::A => &self.a,
            Viseme::B => &self.b,
            Viseme::C => &self.c,
            Viseme::D => &self.d,
            Viseme::E => &self.e,
            Viseme::F => &self.f,
            Viseme::G => &self.g,
            Viseme::I => &self.i,
            Viseme::O => &self.o,
            Viseme::U => &self.u,
            Viseme::TH => &self.th,
            Viseme::WQ => &self.wq,
        };
        entry.as_deref().unwrap_or_else(|| viseme.default_asset())
    }
}
