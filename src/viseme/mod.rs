//! Viseme catalog for lip-sync animation.
//!
//! A viseme is a visual mouth shape that corresponds to one or more phonemes.
//! This module owns the closed set of mouth shapes and the tables that map
//! provider phoneme symbols (ARPABET or IPA) and plain text characters onto it.
//!
//! Classification is total: anything unrecognised is [`Viseme::Rest`].

mod assets;

pub use assets::MouthAssets;

use serde::{Deserialize, Serialize};

/// Mouth shape categories used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Viseme {
    /// Silence (mouth closed, neutral)
    #[default]
    Rest,
    /// Open vowel: /a/, /æ/, /ʌ/
    A,
    /// Bilabial: /p/, /b/, /m/ (lips pressed together)
    B,
    /// Postalveolar: /ʃ/, /ʒ/, /tʃ/, /dʒ/ (lips pushed forward)
    C,
    /// Alveolar: /t/, /d/, /n/, /l/, /s/, /z/, /r/ (tongue at roof)
    D,
    /// Mid vowel: /e/, /ɛ/, /ə/
    E,
    /// Labiodental: /f/, /v/ (teeth on lip)
    F,
    /// Velar: /k/, /g/, /ŋ/ (back of tongue up)
    G,
    /// Close front vowel: /i/, /ɪ/
    I,
    /// Rounded mid vowel: /o/, /ɔ/
    O,
    /// Rounded close vowel: /u/, /ʊ/
    U,
    /// Dental: /θ/, /ð/ (tongue between teeth)
    TH,
    /// Labial-velar: /w/, "qu" (rounded, small)
    WQ,
}

impl Viseme {
    /// Every viseme, `Rest` first.
    pub const ALL: [Viseme; 13] = [
        Viseme::Rest,
        Viseme::A,
        Viseme::B,
        Viseme::C,
        Viseme::D,
        Viseme::E,
        Viseme::F,
        Viseme::G,
        Viseme::I,
        Viseme::O,
        Viseme::U,
        Viseme::TH,
        Viseme::WQ,
    ];

    /// Whether this is one of the vowel shapes.
    pub fn is_vowel(self) -> bool {
        matches!(
            self,
            Viseme::A | Viseme::E | Viseme::I | Viseme::O | Viseme::U
        )
    }

    /// Built-in asset identifier for this viseme.
    ///
    /// The match is exhaustive so adding a viseme without an asset fails to
    /// compile. Hosts can override individual entries with [`MouthAssets`].
    pub fn default_asset(self) -> &'static str {
        match self {
            Viseme::Rest => "mouth_rest",
            Viseme::A => "mouth_a",
            Viseme::B => "mouth_mbp",
            Viseme::C => "mouth_ch",
            Viseme::D => "mouth_open_small",
            Viseme::E => "mouth_e",
            Viseme::F => "mouth_fv",
            Viseme::G => "mouth_open_medium",
            Viseme::I => "mouth_i",
            Viseme::O => "mouth_o",
            Viseme::U => "mouth_u",
            Viseme::TH => "mouth_th",
            Viseme::WQ => "mouth_wq",
        }
    }
}

impl std::fmt::Display for Viseme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Viseme::Rest => "rest",
            Viseme::A => "A",
            Viseme::B => "B",
            Viseme::C => "C",
            Viseme::D => "D",
            Viseme::E => "E",
            Viseme::F => "F",
            Viseme::G => "G",
            Viseme::I => "I",
            Viseme::O => "O",
            Viseme::U => "U",
            Viseme::TH => "TH",
            Viseme::WQ => "WQ",
        };
        f.write_str(name)
    }
}

// ── Symbol tables ───────────────────────────────────────────────────────

/// Whole-symbol matches, checked before the per-character fallback.
///
/// Covers ARPABET digraphs and IPA sequences whose first character alone
/// would classify wrongly (e.g. `tʃ` would otherwise read as `t`).
const SYMBOL_TABLE: &[(&[&str], Viseme)] = &[
    (&["sil", "sp", "spn", "pau", "<sil>", "_"], Viseme::Rest),
    (&["th", "dh", "θ", "ð"], Viseme::TH),
    (
        &["ch", "jh", "sh", "zh", "tʃ", "dʒ", "tɕ", "dʑ", "ʃ", "ʒ"],
        Viseme::C,
    ),
    (&["ng", "ŋ"], Viseme::G),
    (&["w", "wh", "kw", "qu"], Viseme::WQ),
    (&["em"], Viseme::B),
    (&["el", "en", "dx", "nx"], Viseme::D),
    (&["aa", "ae", "ah", "ao", "aw", "ay", "aɪ", "aʊ"], Viseme::A),
    (&["eh", "er", "ey", "eɪ", "ɚ", "ɝ"], Viseme::E),
    (&["ih", "iy"], Viseme::I),
    (&["ow", "oy", "oʊ", "ɔɪ"], Viseme::O),
    (&["uh", "uw"], Viseme::U),
];

/// Per-character articulatory classes (ASCII and IPA).
fn classify_letter(c: char) -> Option<Viseme> {
    let viseme = match c {
        'a' | 'æ' | 'ɑ' | 'ɐ' | 'ʌ' | 'á' | 'à' | 'â' | 'ä' | 'å' => Viseme::A,
        'e' | 'ɛ' | 'ə' | 'ɜ' | 'é' | 'è' | 'ê' | 'ë' => Viseme::E,
        'i' | 'ɪ' | 'y' | 'í' | 'ì' | 'î' | 'ï' => Viseme::I,
        'o' | 'ɔ' | 'ɒ' | 'ó' | 'ò' | 'ô' | 'ö' | 'ø' => Viseme::O,
        'u' | 'ʊ' | 'ɯ' | 'ú' | 'ù' | 'û' | 'ü' => Viseme::U,
        'b' | 'm' | 'p' => Viseme::B,
        'f' | 'v' => Viseme::F,
        'd' | 't' | 'n' | 'l' | 's' | 'z' | 'r' | 'ɾ' | 'ɹ' | 'ɫ' => Viseme::D,
        'c' | 'j' | 'ʃ' | 'ʒ' | 'ç' => Viseme::C,
        'g' | 'k' | 'x' | 'ŋ' | 'ɡ' => Viseme::G,
        'θ' | 'ð' => Viseme::TH,
        'w' | 'q' => Viseme::WQ,
        _ => return None,
    };
    Some(viseme)
}

/// Stress and length marks that carry no articulatory information.
fn is_symbol_noise(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, 'ˈ' | 'ˌ' | 'ː' | 'ˑ' | '\u{0300}'..='\u{036F}')
}

/// Map a provider phoneme symbol to a viseme.
///
/// Case-insensitive. Stress digits (`AA1`) and IPA stress/length marks are
/// ignored. Known multi-character symbols are matched whole; otherwise the
/// first character with an articulatory class decides. Empty or unknown
/// input is [`Viseme::Rest`].
pub fn classify(symbol: &str) -> Viseme {
    let cleaned: String = symbol
        .trim()
        .chars()
        .filter(|c| !is_symbol_noise(*c))
        .flat_map(char::to_lowercase)
        .collect();

    if cleaned.is_empty() {
        return Viseme::Rest;
    }

    for (symbols, viseme) in SYMBOL_TABLE {
        if symbols.contains(&cleaned.as_str()) {
            return *viseme;
        }
    }

    cleaned
        .chars()
        .find_map(classify_letter)
        .unwrap_or(Viseme::Rest)
}

// ── Text heuristics ─────────────────────────────────────────────────────

/// Digraphs whose pair of letters share one mouth shape.
fn digraph(first: char, second: char) -> Option<Viseme> {
    match (first, second) {
        ('t', 'h') => Some(Viseme::TH),
        ('s' | 'c', 'h') => Some(Viseme::C),
        ('p', 'h') => Some(Viseme::F),
        ('w', 'h') | ('q', 'u') => Some(Viseme::WQ),
        ('n', 'g') | ('c', 'k') => Some(Viseme::G),
        _ => None,
    }
}

/// Classify one character of written text, using its neighbours to resolve
/// consonant clusters (`th`, `sh`, `ph`, `ng` …) and soft `c`.
///
/// Whitespace, punctuation, digits and anything without a mouth shape are
/// [`Viseme::Rest`].
pub fn classify_text_char(prev: Option<char>, current: char, next: Option<char>) -> Viseme {
    if !current.is_alphabetic() {
        return Viseme::Rest;
    }
    let lower = |c: char| c.to_lowercase().next().unwrap_or(c);
    let cur = lower(current);
    let prev = prev.map(lower);
    let next = next.map(lower);

    if let Some(n) = next
        && let Some(v) = digraph(cur, n)
    {
        return v;
    }
    if let Some(p) = prev
        && let Some(v) = digraph(p, cur)
    {
        return v;
    }
    if cur == 'c' {
        return match next {
            Some('e' | 'i' | 'y') => Viseme::D,
            _ => Viseme::G,
        };
    }

    classify_letter(cur).unwrap_or(Viseme::Rest)
}

/// Classify every character of `text` in order, one viseme per `char`.
pub fn classify_text(text: &str) -> Vec<Viseme> {
    let chars: Vec<char> = text.chars().collect();
    classify_chars(&chars)
}

/// Classify a sequence of characters with cluster context.
pub fn classify_chars(chars: &[char]) -> Vec<Viseme> {
    (0..chars.len())
        .map(|i| {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            classify_text_char(prev, chars[i], next)
        })
        .collect()
}
