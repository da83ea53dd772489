//! Page text quality assessment.
//!
//! A pure scoring function over extracted page text, used twice by the
//! orchestrator: to accept or reject a whole-document candidate, and to
//! flag individual low-quality pages for the adaptive OCR patch. Scoring
//! must stay deterministic and side-effect free; the weights are a starting
//! calibration and live in [`QualityConfig`] so they can be re-tuned
//! against a labeled corpus without touching call sites.

use crate::encoding::is_cyrillic;

/// Weights and acceptance thresholds for quality scoring.
#[derive(Debug, Clone)]
pub struct QualityConfig {
    /// Divisor applied to cleaned text length.
    pub length_divisor: f64,
    /// Bonus per Cyrillic character.
    pub cyrillic_weight: f64,
    /// Bonus per digit.
    pub digit_weight: f64,
    /// Bonus per distinct character.
    pub unique_weight: f64,
    /// Accept outright at this length.
    pub accept_length: usize,
    /// Accept at this length with strong Cyrillic or digit signal.
    pub accept_length_with_signal: usize,
    /// Cyrillic count that counts as a strong signal.
    pub signal_cyrillic: usize,
    /// Digit count that counts as a strong signal.
    pub signal_digits: usize,
    /// Accept short mixed Cyrillic/numeric text at this length.
    pub accept_length_mixed: usize,
    /// Cyrillic floor for the mixed rule.
    pub mixed_cyrillic: usize,
    /// Digit floor for the mixed rule.
    pub mixed_digits: usize,
    /// Accept at this raw score regardless of composition.
    pub accept_score: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            length_divisor: 80.0,
            cyrillic_weight: 0.4,
            digit_weight: 0.05,
            unique_weight: 0.1,
            accept_length: 200,
            accept_length_with_signal: 120,
            signal_cyrillic: 40,
            signal_digits: 30,
            accept_length_mixed: 70,
            mixed_cyrillic: 20,
            mixed_digits: 2,
            accept_score: 12.0,
        }
    }
}

/// Character statistics of a cleaned page text.
#[derive(Debug, Clone, Copy, Default)]
struct TextStats {
    length: usize,
    cyrillic: usize,
    digits: usize,
    unique: usize,
}

/// Quality score of one page's text. Higher is more readable.
pub fn page_score(text: &str, config: &QualityConfig) -> f64 {
    let cleaned = collapse_whitespace(text);
    let stats = stats(&cleaned);
    stats.length as f64 / config.length_divisor
        + stats.cyrillic as f64 * config.cyrillic_weight
        + stats.digits as f64 * config.digit_weight
        + stats.unique as f64 * config.unique_weight
}

/// Whether extracted text is good enough to accept without falling back to
/// another strategy. Any single clause suffices. Pages failing this are
/// still kept: some text beats no text.
pub fn is_acceptable(text: &str, config: &QualityConfig) -> bool {
    let cleaned = collapse_whitespace(text);
    let s = stats(&cleaned);

    if s.length >= config.accept_length {
        return true;
    }
    if s.length >= config.accept_length_with_signal && s.cyrillic > config.signal_cyrillic {
        return true;
    }
    if s.length >= config.accept_length_with_signal && s.digits > config.signal_digits {
        return true;
    }
    if s.length >= config.accept_length_mixed
        && s.cyrillic >= config.mixed_cyrillic
        && s.digits >= config.mixed_digits
    {
        return true;
    }
    page_score(text, config) >= config.accept_score
}

/// Mean per-page score over a document.
pub fn mean_score(pages: &[String], config: &QualityConfig) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }
    pages.iter().map(|p| page_score(p, config)).sum::<f64>() / pages.len() as f64
}

fn stats(cleaned: &str) -> TextStats {
    let mut s = TextStats::default();
    let mut seen = std::collections::HashSet::new();
    for c in cleaned.chars() {
        s.length += 1;
        if is_cyrillic(c) {
            s.cyrillic += 1;
        }
        if c.is_ascii_digit() {
            s.digits += 1;
        }
        seen.insert(c);
    }
    s.unique = seen.len();
    s
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_deterministic() {
        let config = QualityConfig::default();
        let text = "The quick brown fox jumps over the lazy dog 1234567890.";
        assert_eq!(page_score(text, &config), page_score(text, &config));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\t\tb\n\nc  "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_long_text_accepted() {
        let config = QualityConfig::default();
        let text = "word ".repeat(50); // 249 chars cleaned
        assert!(is_acceptable(&text, &config));
    }

    #[test]
    fn test_short_garbage_rejected() {
        let config = QualityConfig::default();
        assert!(!is_acceptable("", &config));
        assert!(!is_acceptable("xx xx", &config));
    }

    #[test]
    fn test_cyrillic_signal_clause() {
        let config = QualityConfig::default();
        // ~120+ chars, mostly Cyrillic: fails the plain length clause but
        // passes the Cyrillic signal clause.
        let text = "съешь же ещё этих мягких французских булок да выпей чаю ".repeat(3);
        let cleaned = collapse_whitespace(&text);
        assert!(cleaned.chars().count() < config.accept_length);
        assert!(is_acceptable(&text, &config));
    }

    #[test]
    fn test_mixed_cyrillic_numeric_clause() {
        let config = QualityConfig::default();
        let text = "Накладная 4182 от 03.2024 сумма 15000 рублей Иванов Петров склад";
        let cleaned = collapse_whitespace(&text);
        assert!(cleaned.chars().count() >= config.accept_length_mixed);
        assert!(is_acceptable(&text, &config));
    }

    #[test]
    fn test_mean_score() {
        let config = QualityConfig::default();
        let pages = vec!["some text here".to_string(), "".to_string()];
        let mean = mean_score(&pages, &config);
        let expected = (page_score("some text here", &config) + page_score("", &config)) / 2.0;
        assert_eq!(mean, expected);
        assert_eq!(mean_score(&[], &config), 0.0);
    }

    #[test]
    fn test_score_monotonic_in_length() {
        let config = QualityConfig::default();
        let short = page_score("abc def", &config);
        let long = page_score("abc def ghi jkl mno pqr stu vwx", &config);
        assert!(long > short);
    }
}
