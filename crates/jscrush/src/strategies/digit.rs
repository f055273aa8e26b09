//! # Digit-Replacer Variant
//!
//! Binds replacements directly to the decimal digits `'0'..'N'`
//! (`N = max_int` clamped to `1..=10`, since the decoder's `/\d/g` match
//! only ever consumes a single character) instead of drawing
//! provisional bytes from the printable-ASCII alphabet. Because
//! the final token *is* the digit character straight out of the search
//! — there is no allocator remap step — the input must not already
//! contain an ASCII digit, and the decoder is the flat, single-pass
//! `` `<packed>`.replace(/\d/g, i => `p0|p1|...`.split`|`[i]) `` rather
//! than the looping regex-character-class decoder the crusher and beam
//! strategies use.

use crate::errors::{PackError, PackResult};
use crate::options::PackerOptions;

use super::{beam, SearchResult};

/// Check the digit-replacer's hard precondition: the input must contain
/// no ASCII digit.
///
/// ## Arguments
/// * `text` - the candidate input.
///
/// ## Returns
/// `Ok(())` if the input is digit-free, or `PackError::DigitPrecondition`
/// naming the first offending character.
pub fn check_precondition(text: &str) -> PackResult<()> {
    match text.chars().find(|c| c.is_ascii_digit()) {
        Some(offending) => Err(PackError::DigitPrecondition { offending }),
        None => Ok(()),
    }
}

/// Run the digit-replacer search synchronously on the caller's thread,
/// under no external budget.
///
/// ## Arguments
/// * `text` - the input text to compress.
/// * `options` - the packer options; `max_int` bounds the digit
///   alphabet to its first `max_int.clamp(1, 10)` digits.
///
/// ## Returns
/// The best [`SearchResult`] found, bound entirely to digit tokens, or
/// `PackError::DigitPrecondition` if the input contains a digit.
pub fn run(
    text: &str,
    options: &PackerOptions,
) -> PackResult<SearchResult> {
    check_precondition(text)?;
    let (result, _graph, _stop) = beam::run_digit(text, options, &crate::budget::SearchBudget::unbounded());
    Ok(result)
}
