//! # Pattern / Match Data Model
//!
//! A `Pattern` is a candidate
//! repeated substring: it starts life with no bound token, is scored and
//! re-scored as the search mutates the working text, and is finally
//! either bound to a real token by the allocator or retired ("cleared").

use ahash::AHashSet;

/// A single output byte (or, exceptionally, the two-byte `\` sequence)
/// bound to a pattern.
pub type Token = u8;

/// A candidate repeated substring, and everything the search and
/// allocator track about it.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// The substring as it currently appears in the working text.
    pub string: String,

    /// The substring in the *input* text, with any tokens it contains
    /// recursively expanded back to their substrings.
    pub original: String,

    /// The token bound to this pattern, if any.
    pub token: Option<Token>,

    /// Occurrence count in the current text.
    pub copies: usize,

    /// Escaped byte length of `string`.
    pub len: usize,

    /// Net byte gain of applying this substitution.
    pub gain: i64,

    /// Weighted score used for ordering when configured.
    pub score: f64,

    /// Tokens of patterns this one depends on (containment edges).
    ///
    /// During the search a pattern has no token yet, so these sets stay
    /// empty here; [`crate::allocator::bind`] computes the equivalent
    /// containment graph over provisional pattern *indices* instead
    /// (tokens aren't assigned until the allocator runs, so indexing by
    /// token at this stage would be premature).
    pub depends: AHashSet<Token>,

    /// Tokens of patterns that depend on this one. See `depends`.
    pub used_by: AHashSet<Token>,

    /// True once this pattern has been retired (bound or dominated).
    pub cleared: bool,

    /// The index at which this pattern was finally bound by the
    /// allocator.
    pub new_order: Option<usize>,
}

impl Pattern {
    /// Create a fresh, unscored, unbound `Pattern` from a discovered
    /// repeated substring.
    ///
    /// ## Arguments
    /// * `string` - the substring as discovered in the current text.
    /// * `copies` - its occurrence count.
    /// * `delimiter` - the string delimiter byte, used to compute the
    ///   escaped byte length.
    ///
    /// ## Returns
    /// A new `Pattern` with `original` initialized equal to `string`
    /// (callers expand it through earlier bindings as needed) and `gain`
    /// computed via the plain (token-cost-1) formula.
    pub fn new(
        string: impl Into<String>,
        copies: usize,
        delimiter: u8,
    ) -> Self {
        let string = string.into();
        let len = crate::text::escaped_byte_len(&string, delimiter);
        let gain = crate::scorer::gain(copies, len);
        Pattern {
            original: string.clone(),
            string,
            token: None,
            copies,
            len,
            gain,
            score: 0.0,
            depends: AHashSet::new(),
            used_by: AHashSet::new(),
            cleared: false,
            new_order: None,
        }
    }
}
