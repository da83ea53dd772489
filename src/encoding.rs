//! Multi-encoding text recovery.
//!
//! Uploaded plain-text files carry no reliable charset declaration, so the
//! decoder tries strict UTF-8 first and, when that fails, decodes the buffer
//! under a fixed candidate list and keeps the statistically most plausible
//! result. The scoring weights are a calibration, not a law; they live in
//! [`DecodeConfig`] so they can be tuned and tested independently.

use encoding_rs::{Encoding, IBM866, KOI8_R, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1251};
use unicode_normalization::UnicodeNormalization;

/// Candidate encodings, in tie-break order.
const CANDIDATES: &[&Encoding] = &[UTF_8, UTF_16LE, UTF_16BE, WINDOWS_1251, KOI8_R, IBM866];

/// Weights for scoring a decoded candidate.
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    /// Divisor applied to the decoded length.
    pub length_divisor: f64,
    /// Bonus per Cyrillic character.
    pub cyrillic_weight: f64,
    /// Penalty per mojibake character.
    pub mojibake_penalty: f64,
    /// Penalty per control character.
    pub control_penalty: f64,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            length_divisor: 50.0,
            cyrillic_weight: 0.6,
            mojibake_penalty: 4.0,
            control_penalty: 6.0,
        }
    }
}

/// Outcome of decoding a text buffer.
#[derive(Debug, Clone)]
pub struct DecodedText {
    /// Recovered text, NFC-normalized.
    pub text: String,
    /// Label of the encoding that produced it (e.g. `"windows-1251"`).
    pub encoding: &'static str,
}

/// Decode a byte buffer into the best-effort UTF-8 string.
///
/// Strict UTF-8 wins outright when it succeeds. Otherwise every candidate
/// encoding decodes the full buffer and the highest-scoring result is kept,
/// ties resolved by candidate order.
pub fn decode_text(data: &[u8], config: &DecodeConfig) -> DecodedText {
    if let Ok(s) = std::str::from_utf8(data) {
        return DecodedText {
            text: s.nfc().collect(),
            encoding: "utf-8",
        };
    }

    let mut best: Option<(f64, DecodedText)> = None;
    for encoding in CANDIDATES {
        // BOM sniffing may redirect a candidate; report what actually ran.
        let (decoded, actual, _) = encoding.decode(data);
        let score = candidate_score(&decoded, config);
        log::debug!("decode candidate {}: score {:.2}", actual.name(), score);
        // Strictly-greater keeps the earlier candidate on ties.
        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((
                score,
                DecodedText {
                    text: decoded.nfc().collect(),
                    encoding: actual.name(),
                },
            ));
        }
    }

    // CANDIDATES is non-empty, so best is always set.
    best.map(|(_, d)| d).unwrap_or_else(|| DecodedText {
        text: String::new(),
        encoding: "utf-8",
    })
}

/// Score a decoded candidate: longer readable text and Cyrillic content are
/// rewarded, replacement garbage and stray control bytes are punished.
fn candidate_score(text: &str, config: &DecodeConfig) -> f64 {
    let mut cyrillic = 0usize;
    let mut mojibake = 0usize;
    let mut control = 0usize;

    for c in text.chars() {
        if is_cyrillic(c) {
            cyrillic += 1;
        } else if is_mojibake(c) {
            mojibake += 1;
        } else if is_stray_control(c) {
            control += 1;
        }
    }

    text.chars().count() as f64 / config.length_divisor
        + cyrillic as f64 * config.cyrillic_weight
        - mojibake as f64 * config.mojibake_penalty
        - control as f64 * config.control_penalty
}

/// Cyrillic block, the script the legacy candidate encodings exist for.
pub(crate) fn is_cyrillic(c: char) -> bool {
    ('\u{0400}'..='\u{04FF}').contains(&c)
}

/// Replacement characters and the C1 range that a wrong single-byte decode
/// typically lands in.
fn is_mojibake(c: char) -> bool {
    c == '\u{FFFD}' || ('\u{0080}'..='\u{009F}').contains(&c)
}

/// C0 control characters other than ordinary whitespace.
fn is_stray_control(c: char) -> bool {
    c.is_control() && c != '\n' && c != '\r' && c != '\t'
}
