//! Thread compression: cleaning, extraction, dedup, digest rendering and
//! compression metrics.

pub mod cleaner;
pub mod compressor;
pub mod extract;
pub mod format;

pub use cleaner::{clean_body, clean_message};
pub use compressor::{CompressionStats, ThreadCompressor};
pub use format::{Findings, format_digest};

/// Approximate token count: one token per four chars.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// `(1 - compressed/original) * 100`, rounded to two decimals; 0 when the
/// original is empty. Not clamped: a digest longer than its thread goes
/// negative.
pub fn compression_ratio(original_tokens: usize, compressed_tokens: usize) -> f64 {
    if original_tokens == 0 {
        return 0.0;
    }
    round2((1.0 - compressed_tokens as f64 / original_tokens as f64) * 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// First `max` chars of `text`.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_quarter_chars() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 0);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        // chars, not bytes
        assert_eq!(estimate_tokens("••••"), 1);
    }

    #[test]
    fn ratio_special_cases_zero() {
        assert_eq!(compression_ratio(0, 0), 0.0);
        assert_eq!(compression_ratio(0, 10), 0.0);
    }

    #[test]
    fn ratio_is_rounded_not_clamped() {
        assert_eq!(compression_ratio(300, 100), 66.67);
        assert_eq!(compression_ratio(10, 20), -100.0);
        assert_eq!(compression_ratio(100, 0), 100.0);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
