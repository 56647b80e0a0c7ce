use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

/// Number of dot positions in a Braille cell.
pub const DOT_COUNT: usize = 6;

/// A raw cell label exactly as a source annotation carries it, before
/// normalization. Adapters build this at the boundary where labels are first
/// read, so downstream code never has to guess at string shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawLabel {
    /// Textual label: already-canonical binary, a dot-digit list like "246",
    /// or free-form text containing dot digits.
    Text(String),
    /// Bitmask label: bit i set means dot i+1 is raised.
    Mask(u32),
}

impl RawLabel {
    pub fn text(s: impl Into<String>) -> Self {
        RawLabel::Text(s.into())
    }
}

/// Multi-hot encoding of a Braille cell as a fixed six-character string over
/// {'0','1'}, e.g. "101000" for dots 1 and 3.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalLabel(String);

impl CanonicalLabel {
    /// The blank cell: no dots raised.
    pub fn blank() -> Self {
        CanonicalLabel("0".repeat(DOT_COUNT))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    fn from_bits(bits: [bool; DOT_COUNT]) -> Self {
        CanonicalLabel(bits.iter().map(|&b| if b { '1' } else { '0' }).collect())
    }
}

impl fmt::Display for CanonicalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a raw label into its canonical multi-hot form.
///
/// Total: input that carries no usable dot information becomes the blank
/// cell rather than an error, so ingestion never blocks on a bad label.
/// Fallbacks are logged; callers that need to count them use
/// [`try_canonicalize`].
pub fn canonicalize(raw: &RawLabel) -> CanonicalLabel {
    match try_canonicalize(raw) {
        Some(label) => label,
        None => {
            warn!("unrecognized cell label {:?}, falling back to blank", raw);
            CanonicalLabel::blank()
        }
    }
}

/// Like [`canonicalize`], but reports the fallback case as `None` so callers
/// can surface data-quality problems instead of silently absorbing them.
pub fn try_canonicalize(raw: &RawLabel) -> Option<CanonicalLabel> {
    match raw {
        RawLabel::Text(s) => canonicalize_text(s),
        RawLabel::Mask(mask) => {
            let mut bits = [false; DOT_COUNT];
            for (i, bit) in bits.iter_mut().enumerate() {
                *bit = (mask & (1 << i)) != 0;
            }
            Some(CanonicalLabel::from_bits(bits))
        }
    }
}

fn canonicalize_text(s: &str) -> Option<CanonicalLabel> {
    // Already canonical: keep as-is. This check must run before digit
    // extraction so "111111" stays a binary mask and is not reread as the
    // dot list 1,1,1,1,1,1.
    if s.len() == DOT_COUNT && s.bytes().all(|b| b == b'0' || b == b'1') {
        return Some(CanonicalLabel(s.to_string()));
    }

    // Dot-digit list, possibly embedded in other characters. Digits outside
    // 1..=6 carry no dot and are ignored.
    let mut bits = [false; DOT_COUNT];
    let mut saw_digit = false;
    for digit in s.chars().filter_map(|c| c.to_digit(10)) {
        saw_digit = true;
        if (1..=DOT_COUNT as u32).contains(&digit) {
            bits[(digit - 1) as usize] = true;
        }
    }
    if saw_digit {
        Some(CanonicalLabel::from_bits(bits))
    } else {
        None
    }
}
