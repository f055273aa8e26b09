//! # Search Strategies
//!
//! Interchangeable producers of an ordered replacement list: the
//! single-pass greedy [`crusher`], the look-ahead [`beam`] search, and the
//! [`digit`] variant with its optional [`worker`].

pub mod beam;
pub mod crusher;
pub mod digit;
pub mod worker;

use ahash::AHashSet;

use crate::pattern::Token;

/// A single binding produced by a search strategy: a pattern with a real
/// token already assigned and applied to the working text.
#[derive(Debug, Clone)]
pub struct Binding {
    /// The token byte bound to this replacement.
    pub token: Token,
    /// The pattern text that was replaced.
    pub pattern: String,
    /// Its occurrence count at the moment it was bound.
    pub copies: usize,
    /// Its net gain at the moment it was bound.
    pub gain: i64,
    /// Its weighted score at the moment it was bound.
    pub score: f64,
}

/// The outcome of running a search strategy to completion: the final
/// text, the ordered replacement list, and the cumulative gain achieved.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The text after every replacement has been applied.
    pub text: String,
    /// Replacements in application order (earliest-applied first).
    pub replacements: Vec<Binding>,
    /// Sum of every binding's `gain`.
    pub cumulative_gain: i64,
}

/// Build the free-token alphabet: printable ASCII bytes (0x20..=0x7E)
/// absent from `text`, excluding the backtick, carriage return,
/// backslash, and the configured string delimiter.
///
/// ## Arguments
/// * `text` - the text the tokens must be absent from.
/// * `delimiter` - the configured string delimiter byte.
///
/// ## Returns
/// The available token bytes, in ascending order.
pub fn free_token_alphabet(
    text: &str,
    delimiter: u8,
) -> Vec<Token> {
    let present: AHashSet<u8> = text.bytes().collect();
    (0x20u8..=0x7E)
        .filter(|&b| {
            !present.contains(&b)
                && b != b'`'
                && b != b'\r'
                && b != b'\\'
                && b != delimiter
        })
        .collect()
}

/// Pick the next free token absent from the *original* input text and
/// from every token already used on this search path.
///
/// Excluding against the original text rather than the currently
/// mutating working text keeps every provisional token disjoint from
/// real input content for the lifetime of the search — a token value
/// can then never be confused with a literal byte of content when the
/// allocator later remaps provisional tokens to final ones. Using the
/// mutating text instead (as bytes vacated by earlier substitutions
/// become "free") would let a later token collide with an original
/// content byte that merely stopped appearing in the *current* text,
/// making any later byte-for-byte remap ambiguous.
///
/// ## Arguments
/// * `original_text` - the untouched input text for this search run.
/// * `used` - tokens already bound earlier on this path.
/// * `delimiter` - the configured string delimiter byte.
///
/// ## Returns
/// The next available token byte, or `None` if the alphabet is
/// exhausted.
pub fn next_free_token(
    original_text: &str,
    used: &AHashSet<Token>,
    delimiter: u8,
) -> Option<Token> {
    let present: AHashSet<u8> = original_text.bytes().collect();
    (0x20u8..=0x7E).find(|&b| {
        !present.contains(&b)
            && !used.contains(&b)
            && b != b'`'
            && b != b'\r'
            && b != b'\\'
            && b != delimiter
    })
}

/// Which token alphabet a search strategy draws fresh tokens from.
///
/// The crusher and beam strategies bind provisional bytes later remapped
/// by the allocator into a regex character class. The digit-replacer
/// variant instead binds its *final* tokens directly during the search:
/// ASCII decimal digits decoded by a single `/\d/g` pass, which only
/// ever matches one character per substitution, so this alphabet is
/// capped at the ten single digits regardless of how large `max_int` is
/// configured.
#[derive(Debug, Clone, Copy)]
pub enum TokenAlphabet {
    /// Printable ASCII bytes absent from the input.
    Bytes,
    /// `'0'..('0' + n)`, `n` already clamped to `1..=10`.
    Digits(u8),
}

impl TokenAlphabet {
    /// Pick the next fresh token for this alphabet absent from both the
    /// untouched input and every token already used on this search path.
    ///
    /// ## Arguments
    /// * `original_text` - the untouched input for this search run.
    /// * `used` - tokens already bound earlier on this path.
    /// * `delimiter` - the configured string delimiter byte (`Bytes` only).
    ///
    /// ## Returns
    /// The next available token, or `None` if the alphabet is exhausted.
    pub fn next_token(
        &self,
        original_text: &str,
        used: &AHashSet<Token>,
        delimiter: u8,
    ) -> Option<Token> {
        match *self {
            TokenAlphabet::Bytes => next_free_token(original_text, used, delimiter),
            TokenAlphabet::Digits(n) => (0..n).map(|i| b'0' + i).find(|t| !used.contains(t)),
        }
    }
}

/// Apply a chosen pattern to `text`, binding it to `token`. The decoder
/// layout requires the replaced token to be followed by one literal copy
/// of the pattern text, so the rewritten text gets the pattern's first
/// occurrence preceded by a `token + pattern` header once all copies
/// have been folded to bare tokens.
///
/// ## Arguments
/// * `text` - the text to rewrite.
/// * `pattern` - the substring being replaced.
/// * `token` - the token byte newly bound to it.
///
/// ## Returns
/// The rewritten text (still missing its header prefix, which the
/// artefact builder assembles across every binding) and the number of
/// copies replaced.
pub fn apply_binding(
    text: &str,
    pattern: &str,
    token: Token,
) -> (String, usize) {
    let replacement = (token as char).to_string();
    crate::text::replace_counted(text, pattern, &replacement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_token_alphabet_excludes_reserved() {
        let alphabet = free_token_alphabet("abc", b'`');
        assert!(!alphabet.contains(&b'`'));
        assert!(!alphabet.contains(&b'\\'));
        assert!(!alphabet.contains(&b'\r'));
        assert!(!alphabet.contains(&b'a'));
        assert!(alphabet.contains(&b'T'));
    }

    #[test]
    fn test_next_free_token_skips_used_and_reserved() {
        let mut used = AHashSet::new();
        used.insert(b'T');
        let token = next_free_token("abc", &used, b'`').unwrap();
        assert_ne!(token, b'T');
        assert_ne!(token, b'`');
    }

    #[test]
    fn test_apply_binding_replaces_all_copies() {
        let (text, copies) = apply_binding("abcabcabc", "abc", b'T');
        assert_eq!(text, "TTT");
        assert_eq!(copies, 3);
    }

    #[test]
    fn test_digit_alphabet_hands_out_ascending_digits() {
        let alphabet = TokenAlphabet::Digits(3);
        let mut used = AHashSet::new();
        let a = alphabet.next_token("abc", &used, b'`').unwrap();
        assert_eq!(a, b'0');
        used.insert(a);
        let b = alphabet.next_token("abc", &used, b'`').unwrap();
        assert_eq!(b, b'1');
        used.insert(b);
        let c = alphabet.next_token("abc", &used, b'`').unwrap();
        assert_eq!(c, b'2');
        used.insert(c);
        assert!(alphabet.next_token("abc", &used, b'`').is_none());
    }
}
