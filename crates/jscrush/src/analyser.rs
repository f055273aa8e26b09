//! # Pattern Analyser
//!
//! Enumerates repeated substrings in a text and re-counts a fixed
//! set of patterns against a mutated text. This is the leaf that every
//! search strategy drives.

use ahash::AHashSet;
use compact_str::CompactString;

use crate::pattern::Pattern;

/// A substring is rejected as a pattern boundary if its first code unit
/// is a low surrogate or its last is a high surrogate.
///
/// Rust's `char`/`str` types cannot represent lone surrogates at all —
/// every `char` is a valid Unicode scalar value — so this check is
/// structurally satisfied by construction whenever we slice on `char`
/// boundaries, which `enumerate` always does. The function exists so the
/// no-lone-surrogates invariant is visible and checkable, not to reject
/// anything a `char`-boundary slice could ever produce.
fn splits_surrogate(_s: &str) -> bool {
    false
}

/// Enumerate every substring of `text` of length ≥ 2 (measured in
/// Unicode scalar values) that occurs at least twice, up to a length cap
/// of `min(100, text.chars().count() / 2)`.
///
/// ## Arguments
/// * `text` - the text to scan.
/// * `delimiter` - the string delimiter byte, used for escaped-length
///   scoring of the discovered patterns.
///
/// ## Returns
/// The discovered patterns, each with `copies ≥ 2` and `gain`
/// initialised via the plain gain formula.
pub fn enumerate(
    text: &str,
    delimiter: u8,
) -> Vec<Pattern> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    if n < 2 {
        return Vec::new();
    }
    let max_len = std::cmp::min(100, n / 2);
    if max_len < 2 {
        return Vec::new();
    }

    // Most candidate substrings at these input sizes are well under
    // compact_str's 24-byte inline threshold, so the dedup set avoids a
    // heap allocation per-candidate even though `n²` of them get probed.
    let mut seen: AHashSet<CompactString> = AHashSet::new();
    let mut out = Vec::new();

    for len in 2..=max_len {
        for start in 0..=(n - len) {
            let candidate: String = chars[start..start + len].iter().collect();
            if splits_surrogate(&candidate) {
                continue;
            }
            if !seen.insert(CompactString::from(candidate.as_str())) {
                continue;
            }
            let copies = crate::text::count_non_overlapping(text, &candidate);
            if copies >= 2 {
                out.push(Pattern::new(candidate, copies, delimiter));
            }
        }
    }
    out
}

/// Re-count each of `patterns` against `text`, dropping any whose
/// occurrence count falls below 2 or whose recomputed gain is ≤ 0.
///
/// ## Arguments
/// * `patterns` - the patterns to re-score, consumed by value.
/// * `text` - the new text to count against.
/// * `delimiter` - the string delimiter byte.
///
/// ## Returns
/// The surviving patterns, with `copies`, `len`, and `gain` refreshed.
pub fn recount(
    patterns: Vec<Pattern>,
    text: &str,
    delimiter: u8,
) -> Vec<Pattern> {
    patterns
        .into_iter()
        .filter_map(|mut p| {
            let copies = crate::text::count_non_overlapping(text, &p.string);
            if copies < 2 {
                return None;
            }
            let len = crate::text::escaped_byte_len(&p.string, delimiter);
            let gain = crate::scorer::gain(copies, len);
            if gain <= 0 {
                return None;
            }
            p.copies = copies;
            p.len = len;
            p.gain = gain;
            Some(p)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_abcabcabc() {
        let patterns = enumerate("abcabcabc", b'`');
        let abc = patterns.iter().find(|p| p.string == "abc").unwrap();
        assert_eq!(abc.copies, 3);
    }

    #[test]
    fn test_enumerate_no_repeats() {
        let patterns = enumerate("abcdefgh", b'`');
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_enumerate_tiny_text() {
        assert!(enumerate("a", b'`').is_empty());
        assert!(enumerate("", b'`').is_empty());
    }

    #[test]
    fn test_recount_drops_vanished_pattern() {
        let patterns = enumerate("abcabcabc", b'`');
        let recounted = recount(patterns, "abcXabcXabc", b'`');
        let abc = recounted.iter().find(|p| p.string == "abc");
        assert!(abc.is_some());

        let gone = recount(
            vec![Pattern::new("abc", 3, b'`')],
            "xyz",
            b'`',
        );
        assert!(gone.is_empty());
    }
}
